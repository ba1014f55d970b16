//! The `guide` command
//!
//! Toggles the directional guide for every chest key the sender holds.
//! Each key toggles independently; a key whose chest is gone gets its
//! own message instead of failing the whole invocation.

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutcome, CommandSender};
use crate::service::{ChestService, GuideToggle};

pub struct GuideCommand;

#[async_trait]
impl Command for GuideCommand {
    fn name(&self) -> &str {
        "guide"
    }

    fn description(&self) -> &str {
        "Toggle the guide trail for the chest keys you hold"
    }

    fn usage(&self) -> &str {
        "/mysticchests guide"
    }

    async fn execute(&self, service: &ChestService, ctx: &CommandContext) -> CommandOutcome {
        let CommandSender::Player { keys, .. } = &ctx.sender else {
            return CommandOutcome::message("Only players can execute this command!");
        };

        if keys.is_empty() {
            return CommandOutcome::message("You are not holding any mystic chest keys.");
        }

        let mut messages = Vec::with_capacity(keys.len());
        for key in keys {
            let line = match service.toggle_guide(&key.name).await {
                GuideToggle::Started => format!("Guide enabled for chest '{}'.", key.name),
                GuideToggle::Stopped => format!("Guide disabled for chest '{}'.", key.name),
                GuideToggle::UnknownChest => {
                    format!("The chest '{}' no longer exists.", key.name)
                }
            };
            messages.push(line);
        }
        CommandOutcome::Messages(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mysticchests_shared::models::{ChestKey, Location};
    use tempfile::TempDir;

    async fn test_service(dir: &TempDir) -> ChestService {
        let mut config = Config::default();
        config.storage.database_path = dir.path().join("chests.db");
        let (service, _hints) = ChestService::new(config).unwrap();
        service.startup().await.unwrap();
        service
    }

    fn player_with(keys: Vec<ChestKey>) -> CommandContext {
        CommandContext {
            sender: CommandSender::Player {
                name: "alex".to_string(),
                position: Location::new("overworld", 0, 64, 0),
                keys,
            },
            args: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_requires_a_player() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir).await;
        let ctx = CommandContext {
            sender: CommandSender::Console,
            args: Vec::new(),
        };

        match GuideCommand.execute(&service, &ctx).await {
            CommandOutcome::Messages(lines) => {
                assert_eq!(lines, vec!["Only players can execute this command!"]);
            }
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reports_empty_hands() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir).await;

        match GuideCommand.execute(&service, &player_with(Vec::new())).await {
            CommandOutcome::Messages(lines) => {
                assert_eq!(lines, vec!["You are not holding any mystic chest keys."]);
            }
            other => panic!("expected messages, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_toggles_each_held_key() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir).await;

        let at = Location::new("overworld", 1, 64, 1);
        service
            .create_chest("vault", at.clone(), Vec::new())
            .await
            .unwrap();

        let keys = vec![
            ChestKey::new(at, "vault"),
            ChestKey::new(Location::new("overworld", 9, 64, 9), "ghost"),
        ];

        match GuideCommand.execute(&service, &player_with(keys.clone())).await {
            CommandOutcome::Messages(lines) => {
                assert_eq!(lines.len(), 2);
                assert!(lines[0].contains("enabled"));
                assert!(lines[1].contains("no longer exists"));
            }
            other => panic!("expected messages, got {other:?}"),
        }

        // A second invocation flips the live chest back off.
        match GuideCommand.execute(&service, &player_with(keys)).await {
            CommandOutcome::Messages(lines) => assert!(lines[0].contains("disabled")),
            other => panic!("expected messages, got {other:?}"),
        }
    }
}
