//! The `create` command
//!
//! Starts the chest-creation flow: validates the name, then asks the
//! host to open a loot-capture view at the creator's position. The host
//! finishes the flow by passing the captured items to
//! [`ChestService::create_chest`](crate::service::ChestService::create_chest),
//! which hands back the key.

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutcome, CommandSender};
use crate::service::ChestService;

pub struct CreateCommand;

#[async_trait]
impl Command for CreateCommand {
    fn name(&self) -> &str {
        "create"
    }

    fn description(&self) -> &str {
        "Create a mystic chest at your position"
    }

    fn usage(&self) -> &str {
        "/mysticchests create <name>"
    }

    fn complete(&self, ctx: &CommandContext) -> Vec<String> {
        if ctx.args.len() <= 1 {
            vec!["<name>".to_string()]
        } else {
            Vec::new()
        }
    }

    async fn execute(&self, service: &ChestService, ctx: &CommandContext) -> CommandOutcome {
        let CommandSender::Player { position, .. } = &ctx.sender else {
            return CommandOutcome::message("Only players can execute this command!");
        };

        let [name] = ctx.args.as_slice() else {
            return CommandOutcome::message(format!("Usage: {}", self.usage()));
        };

        // The capture flow re-checks on completion; this early check is
        // only for immediate feedback.
        if service.chest_exists(name).await {
            return CommandOutcome::message("A mystic chest with this name already exists!");
        }

        CommandOutcome::AwaitLoot {
            name: name.clone(),
            location: position.clone(),
            messages: vec!["Insert the chest loot, then close the container.".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mysticchests_shared::models::Location;
    use tempfile::TempDir;

    async fn test_service(dir: &TempDir) -> ChestService {
        let mut config = Config::default();
        config.storage.database_path = dir.path().join("chests.db");
        let (service, _hints) = ChestService::new(config).unwrap();
        service.startup().await.unwrap();
        service
    }

    fn ctx(sender: CommandSender, args: &[&str]) -> CommandContext {
        CommandContext {
            sender,
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn player_at(x: i32) -> CommandSender {
        CommandSender::Player {
            name: "alex".to_string(),
            position: Location::new("overworld", x, 64, 0),
            keys: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_requires_a_player() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir).await;

        match CreateCommand
            .execute(&service, &ctx(CommandSender::Console, &["vault"]))
            .await
        {
            CommandOutcome::Messages(lines) => {
                assert_eq!(lines, vec!["Only players can execute this command!"]);
            }
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_requires_exactly_one_name() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir).await;

        for args in [&[] as &[&str], &["a", "b"]] {
            match CreateCommand.execute(&service, &ctx(player_at(0), args)).await {
                CommandOutcome::Messages(lines) => assert!(lines[0].starts_with("Usage:")),
                other => panic!("expected usage message, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_starts_capture_at_player_position() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir).await;

        match CreateCommand
            .execute(&service, &ctx(player_at(7), &["vault"]))
            .await
        {
            CommandOutcome::AwaitLoot { name, location, .. } => {
                assert_eq!(name, "vault");
                assert_eq!(location, Location::new("overworld", 7, 64, 0));
            }
            other => panic!("expected capture, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_duplicate_names_up_front() {
        let dir = TempDir::new().unwrap();
        let service = test_service(&dir).await;
        service
            .create_chest("vault", Location::new("overworld", 0, 64, 0), Vec::new())
            .await
            .unwrap();

        match CreateCommand
            .execute(&service, &ctx(player_at(3), &["vault"]))
            .await
        {
            CommandOutcome::Messages(lines) => {
                assert_eq!(lines, vec!["A mystic chest with this name already exists!"]);
            }
            other => panic!("expected refusal, got {other:?}"),
        }
    }
}
