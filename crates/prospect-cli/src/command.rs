//! Command line parsing.
//!
//! The grammar is small enough that positional parsing by hand stays
//! readable: a verb, usually a player id, then verb-specific arguments.

use prospect_core::SellAmount;
use prospect_types::{Gear, PlayerId, ResourceKind};

use crate::error::CliError;

/// Help text printed on usage errors.
pub const USAGE: &str = "\
usage: prospect <command> [args]

commands:
  migrate                              apply database migrations
  shop                                 list gear and drop tables
  register <player>                    create a player record
  collect <player>                     collect accumulated resources
  status <player>                      show level, inventory and cooldown
  preview-rebirth <player>             show what a rebirth would do
  rebirth <player> --confirm           reset for a permanent bonus
  buy <player> <gear>                  buy and equip gear
  sell <player> <resource> [n|all]     sell resources (default: all)
  ledger <player>                      list wallet movements

environment:
  PROSPECT_CONFIG   config file (default: prospect-config.yaml)
  DATABASE_URL      overrides infrastructure.postgres_url
  RUST_LOG          overrides logging.level";

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Apply migrations.
    Migrate,
    /// Print the catalogs.
    Shop,
    /// Create a record.
    Register(PlayerId),
    /// Collect.
    Collect(PlayerId),
    /// Show a status summary.
    Status(PlayerId),
    /// Show a rebirth preview.
    PreviewRebirth(PlayerId),
    /// Rebirth. Without confirmation only the preview is shown.
    Rebirth {
        /// Who.
        player: PlayerId,
        /// Whether `--confirm` was given.
        confirmed: bool,
    },
    /// Buy gear.
    Buy {
        /// Who.
        player: PlayerId,
        /// What.
        gear: Gear,
    },
    /// Sell resources.
    Sell {
        /// Who.
        player: PlayerId,
        /// What.
        resource: ResourceKind,
        /// How much.
        amount: SellAmount,
    },
    /// List ledger entries.
    Ledger(PlayerId),
}

impl Command {
    /// Parse the arguments after the program name.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Usage`] for unknown verbs, missing or extra
    /// arguments, and unparseable values.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let verb = args.next().ok_or_else(|| CliError::usage("missing command"))?;

        let command = match verb.as_str() {
            "migrate" => Self::Migrate,
            "shop" => Self::Shop,
            "register" => Self::Register(player(&mut args)?),
            "collect" => Self::Collect(player(&mut args)?),
            "status" => Self::Status(player(&mut args)?),
            "preview-rebirth" => Self::PreviewRebirth(player(&mut args)?),
            "rebirth" => {
                let player = player(&mut args)?;
                let confirmed = match args.next().as_deref() {
                    None => false,
                    Some("--confirm") => true,
                    Some(other) => {
                        return Err(CliError::usage(format!("unexpected argument {other:?}")));
                    }
                };
                Self::Rebirth { player, confirmed }
            }
            "buy" => {
                let player = player(&mut args)?;
                let name = required(&mut args, "gear")?;
                let gear = Gear::from_name(&name)
                    .ok_or_else(|| CliError::usage(format!("unknown gear {name:?}")))?;
                Self::Buy { player, gear }
            }
            "sell" => {
                let player = player(&mut args)?;
                let name = required(&mut args, "resource")?;
                let resource = ResourceKind::from_name(&name)
                    .ok_or_else(|| CliError::usage(format!("unknown resource {name:?}")))?;
                let amount = match args.next().as_deref() {
                    None | Some("all") => SellAmount::All,
                    Some(raw) => SellAmount::Exactly(raw.parse().map_err(|e| {
                        CliError::usage(format!("invalid quantity {raw:?}: {e}"))
                    })?),
                };
                Self::Sell {
                    player,
                    resource,
                    amount,
                }
            }
            "ledger" => Self::Ledger(player(&mut args)?),
            other => return Err(CliError::usage(format!("unknown command {other:?}"))),
        };

        if let Some(extra) = args.next() {
            return Err(CliError::usage(format!("unexpected argument {extra:?}")));
        }
        Ok(command)
    }

    /// Whether the command needs the database.
    pub const fn needs_store(&self) -> bool {
        !matches!(self, Self::Shop)
    }
}

fn required(args: &mut impl Iterator<Item = String>, what: &str) -> Result<String, CliError> {
    args.next()
        .ok_or_else(|| CliError::usage(format!("missing {what}")))
}

fn player(args: &mut impl Iterator<Item = String>) -> Result<PlayerId, CliError> {
    let raw = required(args, "player id")?;
    raw.parse()
        .map_err(|e| CliError::usage(format!("invalid player id {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CliError> {
        Command::parse(line.split_whitespace().map(String::from))
    }

    #[test]
    fn player_commands() {
        assert!(matches!(parse("collect 42"), Ok(Command::Collect(PlayerId(42)))));
        assert!(matches!(parse("status 7"), Ok(Command::Status(PlayerId(7)))));
        assert!(matches!(parse("migrate"), Ok(Command::Migrate)));
    }

    #[test]
    fn rebirth_requires_explicit_confirmation() {
        assert!(matches!(
            parse("rebirth 1"),
            Ok(Command::Rebirth {
                confirmed: false,
                ..
            })
        ));
        assert!(matches!(
            parse("rebirth 1 --confirm"),
            Ok(Command::Rebirth {
                confirmed: true,
                ..
            })
        ));
        assert!(parse("rebirth 1 --yes").is_err());
    }

    #[test]
    fn buy_and_sell_arguments() {
        assert!(matches!(
            parse("buy 3 mine_cart"),
            Ok(Command::Buy {
                gear: Gear::MineCart,
                ..
            })
        ));
        assert!(matches!(
            parse("sell 3 coal 12"),
            Ok(Command::Sell {
                resource: ResourceKind::Coal,
                amount: SellAmount::Exactly(12),
                ..
            })
        ));
        assert!(matches!(
            parse("sell 3 coal"),
            Ok(Command::Sell {
                amount: SellAmount::All,
                ..
            })
        ));
    }

    #[test]
    fn bad_input_is_a_usage_error() {
        for line in [
            "",
            "dig 1",
            "collect",
            "collect abc",
            "collect 1 2",
            "buy 1 laser",
            "sell 1 coal -3",
        ] {
            assert!(
                matches!(parse(line), Err(CliError::Usage { .. })),
                "accepted {line:?}"
            );
        }
    }

    #[test]
    fn only_shop_runs_offline() {
        assert!(!Command::Shop.needs_store());
        assert!(Command::Migrate.needs_store());
    }
}
