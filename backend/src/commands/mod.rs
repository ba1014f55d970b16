//! Admin command surface
//!
//! Commands arrive as pre-tokenized arguments with a typed sender; the
//! manager dispatches on the first token and also answers tab-completion
//! queries. Replies are plain message strings the host renders; the one
//! host-mediated flow (loot capture during creation) is expressed as a
//! dedicated outcome the host must finish by calling
//! [`ChestService::create_chest`](crate::service::ChestService::create_chest).

use async_trait::async_trait;
use tracing::debug;

use mysticchests_shared::models::{ChestKey, Location};

use crate::service::ChestService;

mod create;
mod guide;

pub use create::CreateCommand;
pub use guide::GuideCommand;

/// Who issued a command.
#[derive(Debug, Clone)]
pub enum CommandSender {
    /// A player in-world, with their position and the keys they hold.
    Player {
        name: String,
        position: Location,
        keys: Vec<ChestKey>,
    },

    /// The host console.
    Console,
}

impl CommandSender {
    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player { .. })
    }
}

/// One parsed command invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub sender: CommandSender,

    /// Arguments after the command name.
    pub args: Vec<String>,
}

/// What the host must do with a finished command.
#[derive(Debug)]
pub enum CommandOutcome {
    /// Render these messages to the sender.
    Messages(Vec<String>),

    /// Open a loot-capture view for a pending chest, then finish the
    /// flow with [`ChestService::create_chest`].
    AwaitLoot {
        name: String,
        location: Location,
        messages: Vec<String>,
    },
}

impl CommandOutcome {
    fn message(text: impl Into<String>) -> Self {
        Self::Messages(vec![text.into()])
    }
}

/// A single admin command.
#[async_trait]
pub trait Command: Send + Sync {
    /// The token this command dispatches on.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn usage(&self) -> &str;

    /// Completion candidates for the current argument list.
    fn complete(&self, _ctx: &CommandContext) -> Vec<String> {
        Vec::new()
    }

    async fn execute(&self, service: &ChestService, ctx: &CommandContext) -> CommandOutcome;
}

/// Registry and dispatcher for all commands.
pub struct CommandManager {
    commands: Vec<Box<dyn Command>>,
}

impl CommandManager {
    pub fn new() -> Self {
        Self {
            commands: vec![Box::new(CreateCommand), Box::new(GuideCommand)],
        }
    }

    /// Dispatch a tokenized invocation; the first token selects the
    /// command, the rest become its arguments.
    pub async fn dispatch(
        &self,
        service: &ChestService,
        sender: CommandSender,
        tokens: &[String],
    ) -> CommandOutcome {
        let Some((name, args)) = tokens.split_first() else {
            return CommandOutcome::Messages(self.help_lines());
        };

        let Some(command) = self.find(name) else {
            debug!("unknown command {name:?}");
            let mut lines = vec![format!("Unknown command: {name}")];
            lines.extend(self.help_lines());
            return CommandOutcome::Messages(lines);
        };

        let ctx = CommandContext {
            sender,
            args: args.to_vec(),
        };
        command.execute(service, &ctx).await
    }

    /// Tab-completion candidates for a partial invocation.
    pub fn complete(&self, sender: CommandSender, tokens: &[String]) -> Vec<String> {
        match tokens {
            [] => self.commands.iter().map(|c| c.name().to_string()).collect(),
            [partial] => self
                .commands
                .iter()
                .map(|c| c.name().to_string())
                .filter(|name| name.starts_with(partial.as_str()))
                .collect(),
            [name, args @ ..] => match self.find(name) {
                Some(command) => command.complete(&CommandContext {
                    sender,
                    args: args.to_vec(),
                }),
                None => Vec::new(),
            },
        }
    }

    fn find(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    fn help_lines(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|c| format!("{} - {}", c.usage(), c.description()))
            .collect()
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}
