//! The operator shell: read a line, match it against the grammar, dispatch.

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use super::{
    ACTIVATED_FLAG, DEFAULT_INTRO, DEFAULT_PROMPT, LABEL_WIDTH,
    command::{self, Command},
    error::{CommandError, CommandResult, ControlError},
    input::{LineReader, ReadLine},
};
use crate::internal::{
    bot::Bot,
    grammar::{
        CompiledGrammar, GrammarCompiler, MatchResult, TokenRegistry, default_command_specs,
        tokens,
    },
    plugin::{PluginId, SharedPlugin},
};

const INVALID_COMMAND: &str = "not a valid command";
const INVALID_INDEX: &str = "need a valid plugin index";
const EMPTY_ADD: &str = "need a valid plugin name";

/// Presentation settings of a [`Control`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlOptions {
    pub prompt: String,
    pub intro: String,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            intro: DEFAULT_INTRO.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Running,
    Finished,
}

/// Administers a running bot from a line-oriented console.
pub struct Control<B: Bot, R: LineReader, W: Write> {
    pub(super) bot: Arc<B>,
    /// Every plugin known to the shell, active or not, in id order.
    pub(super) available: Vec<SharedPlugin>,
    /// The plugin exposing the gold ledger, if any was loaded.
    pub(super) ledger: Option<SharedPlugin>,
    registry: TokenRegistry,
    grammar: CompiledGrammar,
    pub(super) reader: R,
    pub(super) out: W,
    options: ControlOptions,
    state: ControlState,
}

impl<B: Bot, R: LineReader, W: Write + Send> Control<B, R, W> {
    /// Build the shell around `bot`.
    ///
    /// Compiles the grammar, starts the bot's event loop in the background,
    /// loads the persistent data of every plugin and activates them all.
    /// Must be called from within a Tokio runtime.
    pub fn new(
        bot: Arc<B>,
        plugins: Vec<SharedPlugin>,
        reader: R,
        out: W,
        options: ControlOptions,
    ) -> Result<Self, ControlError> {
        let registry = TokenRegistry::default();
        let grammar = GrammarCompiler::new(&registry).compile(&default_command_specs())?;
        command::check_routes(&grammar)?;

        // The event loop ends on disconnect; nobody waits for it.
        tokio::spawn(bot.clone().run());

        for plugin in &plugins {
            if let Err(e) = plugin.load_persistent_data() {
                tracing::warn!("could not load data of plugin {}: {}", plugin.label(), e);
            }
            bot.add_plugin(plugin.clone());
            tracing::info!("PLUGIN LOADED: {}", plugin.label());
        }
        assert!(
            plugins.iter().all(|p| bot.has_plugin(p.id())),
            "every loaded plugin must be active at startup"
        );

        let ledger = plugins
            .iter()
            .find(|p| p.as_gold_ledger().is_some())
            .cloned();
        tracing::info!(nick = bot.nick(), "Connected !");

        Ok(Self {
            bot,
            available: plugins,
            ledger,
            registry,
            grammar,
            reader,
            out,
            options,
            state: ControlState::Running,
        })
    }

    /// Run the read-dispatch loop until the shell is finished.
    ///
    /// End of input and Ctrl-C behave like `quit`. If the terminal fails, the
    /// plugins are still saved and the bot disconnected before the error is
    /// returned.
    pub async fn run(&mut self) -> Result<(), ControlError> {
        let result = self.read_eval().await;
        if let Err(e) = &result {
            tracing::warn!("shell stopped: {e}");
            if let Err(e) = self.disconnect() {
                tracing::warn!("could not report save failures: {e}");
            }
        }
        tracing::info!("Disconnected !");
        result
    }

    async fn read_eval(&mut self) -> Result<(), ControlError> {
        writeln!(self.out, "{}", self.options.intro)?;
        self.out.flush()?;

        while self.state == ControlState::Running {
            let prompt = self.options.prompt.clone();
            match self.reader.read_line(&prompt).await? {
                ReadLine::Line(line) => self.execute(&line).await?,
                ReadLine::Eof | ReadLine::Interrupted => self.disconnect()?,
            }
            self.out.flush()?;
        }
        Ok(())
    }

    /// Parse and execute one line.
    ///
    /// Invalid lines and command failures are reported on the output; only
    /// terminal I/O failures are returned.
    pub async fn execute(&mut self, line: &str) -> Result<(), ControlError> {
        let Some(found) = self.grammar.matches(line) else {
            writeln!(self.out, "{INVALID_COMMAND}")?;
            return Ok(());
        };
        tracing::debug!(
            "LINE: cmd={:?} subcmd={:?} args={:?}",
            found.cmd,
            found.subcmd,
            found.args
        );

        match self.dispatch(&found).await {
            Ok(()) => Ok(()),
            Err(CommandError::Io(e)) => Err(e.into()),
            Err(e) => {
                writeln!(self.out, "ERROR: {e}")?;
                Ok(())
            }
        }
    }

    async fn dispatch(&mut self, found: &MatchResult) -> CommandResult {
        // Routes were checked against the grammar at construction.
        let Some(command) = Command::from_name(&found.command) else {
            unreachable!("unrouted command {}", found.command);
        };
        let subcmd = found.subcmd.as_deref().unwrap_or_default();
        let args = found.args.as_deref();

        match command {
            Command::Plugins => self.plugins(subcmd, args),
            Command::Quit => Ok(self.disconnect()?),
            Command::Say => self.say(args.unwrap_or_default()),
            Command::Irc => self.irc(args.unwrap_or_default()),
            Command::Help => self.help(),
            Command::Operate => self.operate().await,
            Command::Sudoers => self.sudoers(subcmd, args.unwrap_or_default()),
            Command::Debug => self.debug(),
            Command::Save => self.save(),
        }
    }

    /// Save all plugin data, then disconnect the bot. Runs at most once.
    ///
    /// The bot is disconnected even when save failures cannot be reported.
    pub fn disconnect(&mut self) -> std::io::Result<()> {
        if self.state == ControlState::Finished {
            return Ok(());
        }
        let reported = self.save_persistent_data();
        self.state = ControlState::Finished;
        self.bot.disconnect();
        reported
    }

    /// Ask every known plugin to persist its data. Failures are reported once
    /// every plugin had its turn.
    pub fn save_persistent_data(&mut self) -> std::io::Result<()> {
        let mut failures = Vec::new();
        for plugin in &self.available {
            match plugin.save_persistent_data() {
                Ok(()) => tracing::debug!("plugin data saved: {}", plugin.label()),
                Err(e) => {
                    tracing::warn!("could not save data of plugin {}: {}", plugin.label(), e);
                    failures.push(format!("ERROR: could not save {}: {}", plugin.label(), e));
                }
            }
        }
        for failure in failures {
            writeln!(self.out, "{failure}")?;
        }
        Ok(())
    }

    fn plugins(&mut self, subcmd: &str, args: Option<&str>) -> CommandResult {
        if self.registry.contains(tokens::PLUGINS_LS, subcmd) {
            assert!(args.is_none(), "`plugins {subcmd}` takes no arguments");
            for plugin in &self.available {
                if self.bot.has_plugin(plugin.id()) {
                    writeln!(
                        self.out,
                        "{:<width$}{ACTIVATED_FLAG}",
                        plugin.label(),
                        width = LABEL_WIDTH
                    )?;
                } else {
                    writeln!(self.out, "{}", plugin.label())?;
                }
            }
        } else if self.registry.contains(tokens::PLUGINS_PRINT, subcmd) {
            assert!(args.is_none(), "`plugins {subcmd}` takes no arguments");
            for plugin in self.bot.plugins() {
                writeln!(self.out, "{}", plugin.label())?;
            }
        } else if self.registry.contains(tokens::PLUGINS_ADD, subcmd) {
            let ids: BTreeSet<PluginId> = parse_ids(args.unwrap_or_default())?.into_iter().collect();
            if ids.is_empty() {
                return Err(CommandError::argument(EMPTY_ADD));
            }
            for id in ids {
                match self.available.iter().find(|p| p.id() == id) {
                    None => writeln!(self.out, "{id} not found!")?,
                    Some(plugin) if self.bot.has_plugin(id) => {
                        writeln!(self.out, "PLUGINS: already active: {}", plugin.label())?
                    }
                    Some(plugin) => {
                        self.bot.add_plugin(plugin.clone());
                        tracing::info!("PLUGIN ACTIVATED: {}", plugin.label());
                    }
                }
            }
        } else if self.registry.contains(tokens::PLUGINS_DEL, subcmd) {
            // every id is parsed before anything is removed
            let ids = parse_ids(args.unwrap_or_default())?;
            if ids.is_empty() {
                return Err(CommandError::argument(INVALID_INDEX));
            }
            for id in ids {
                if self.bot.del_plugin(id) {
                    tracing::info!("PLUGIN DEACTIVATED: {id}");
                } else {
                    writeln!(self.out, "{id} not found!")?;
                }
            }
        } else {
            unreachable!("plugins subcommand {subcmd:?} accepted by the grammar");
        }
        Ok(())
    }

    fn sudoers(&mut self, subcmd: &str, nick: &str) -> CommandResult {
        if self.registry.contains(tokens::SUDO_ADD, subcmd) {
            self.bot.add_sudoer(nick);
            writeln!(self.out, "New sudo: {nick}")?;
        } else if self.registry.contains(tokens::SUDO_DEL, subcmd) {
            if self.bot.rmv_sudoer(nick) {
                writeln!(self.out, "{nick} is no longer a sudoer")?;
            } else {
                writeln!(self.out, "{nick} is not a sudoer")?;
            }
        } else {
            unreachable!("sudoers subcommand {subcmd:?} accepted by the grammar");
        }

        let sudoers = self.bot.sudoers();
        if sudoers.is_empty() {
            writeln!(self.out, "Sudoers: (none)")?;
        } else {
            let names: Vec<&str> = sudoers.iter().map(String::as_str).collect();
            writeln!(self.out, "Sudoers: {}", names.join(", "))?;
        }
        Ok(())
    }

    fn say(&mut self, text: &str) -> CommandResult {
        self.bot.send_message(text);
        tracing::debug!("Said: {text}");
        Ok(())
    }

    fn irc(&mut self, args: &str) -> CommandResult {
        let count: i64 = args
            .trim()
            .parse()
            .map_err(|_| CommandError::argument("need a valid number of messages"))?;
        if count > 0 {
            Err(CommandError::unsupported(format!(
                "showing the last {count} messages is not supported by this bot"
            )))
        } else {
            Err(CommandError::argument(format!(
                "{count} is not a valid number of messages to display"
            )))
        }
    }

    fn help(&mut self) -> CommandResult {
        writeln!(self.out, "{}", command::help_text(&self.registry))?;
        writeln!(self.out, "Plugins:")?;
        for plugin in &self.available {
            writeln!(self.out, "  {}: {}", plugin.label(), plugin.help())?;
        }
        Ok(())
    }

    fn debug(&mut self) -> CommandResult {
        for plugin in &self.available {
            writeln!(self.out, "{} [{}]", plugin.label(), plugin.kind())?;
            let data = plugin.debug_data();
            if !data.is_empty() {
                writeln!(self.out, "\t{data}")?;
            }
        }
        Ok(())
    }

    fn save(&mut self) -> CommandResult {
        self.save_persistent_data()?;
        writeln!(self.out, "data saved")?;
        Ok(())
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ControlState::Finished
    }

    pub fn bot(&self) -> &Arc<B> {
        &self.bot
    }

    pub fn available_plugins(&self) -> &[SharedPlugin] {
        &self.available
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

/// Parse whitespace-separated plugin ids. Fails if any of them is not one.
fn parse_ids(args: &str) -> CommandResult<Vec<PluginId>> {
    args.split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<PluginId>, _>>()
        .map_err(|_| CommandError::argument(INVALID_INDEX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{
        bot::LocalBot,
        control::ScriptReader,
        plugin::{PluginStore, import_plugins},
    };

    fn shell(
        tmp: &tempfile::TempDir,
    ) -> Control<LocalBot, ScriptReader, Vec<u8>> {
        let store = PluginStore::new(tmp.path());
        let kinds = ["todolist", "corrector", "gold"].map(String::from);
        Control::new(
            LocalBot::new("munin"),
            import_plugins(&kinds, &store),
            ScriptReader::default(),
            Vec::new(),
            ControlOptions::default(),
        )
        .unwrap()
    }

    fn take_output(control: &mut Control<LocalBot, ScriptReader, Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut control.out)).unwrap()
    }

    fn active_ids(control: &Control<LocalBot, ScriptReader, Vec<u8>>) -> Vec<PluginId> {
        control.bot().plugins().iter().map(|p| p.id()).collect()
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids(" 2  3 ").unwrap(), [2, 3]);
        assert!(parse_ids("").unwrap().is_empty());
        assert!(parse_ids("2 x").is_err());
        assert!(parse_ids("-1").is_err());
    }

    #[tokio::test]
    async fn test_ls_marks_newly_activated() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("plugins del 2").await.unwrap();
        control.execute("plugins ls").await.unwrap();
        let before = take_output(&mut control);
        assert!(before.contains("\n2: corrector\n"));

        control.execute("plugins add 2").await.unwrap();
        control.execute("plugins ls").await.unwrap();
        let after = take_output(&mut control);
        assert!(after.contains(&format!("{:<20}\t\t[ACTIVATED]", "2: corrector")));
        assert_eq!(after.matches("[ACTIVATED]").count(), 3);
    }

    #[tokio::test]
    async fn test_all_plugins_active_at_startup() {
        let tmp = tempfile::TempDir::new().unwrap();
        let control = shell(&tmp);
        assert_eq!(active_ids(&control), [1, 2, 3]);
        assert_eq!(control.state(), ControlState::Running);
    }

    #[tokio::test]
    async fn test_invalid_line() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("dance").await.unwrap();
        control.execute("plugins add").await.unwrap();
        control.execute("quit now").await.unwrap();
        assert_eq!(
            take_output(&mut control),
            "not a valid command\nnot a valid command\nnot a valid command\n"
        );
        assert!(!control.is_finished());
    }

    #[tokio::test]
    async fn test_plugins_ls_marks_active() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("pg rm 2").await.unwrap();
        control.execute("plugins ls").await.unwrap();
        let expected = format!(
            "{:<20}\t\t[ACTIVATED]\n2: corrector\n{:<20}\t\t[ACTIVATED]\n",
            "1: todolist", "3: gold"
        );
        assert_eq!(take_output(&mut control), expected);
    }

    #[tokio::test]
    async fn test_plugins_add_del_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);

        control.execute("plugins del 1 3").await.unwrap();
        assert_eq!(active_ids(&control), [2]);

        control.execute("plg activate 3 1").await.unwrap();
        let mut ids = active_ids(&control);
        ids.sort();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(take_output(&mut control), "");
    }

    #[tokio::test]
    async fn test_plugins_add_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("plugins del 2 3").await.unwrap();

        control.execute("plugins add 2 3").await.unwrap();
        assert_eq!(take_output(&mut control), "");
        control.execute("plugins add 2 3").await.unwrap();
        assert_eq!(
            take_output(&mut control),
            "PLUGINS: already active: 2: corrector\nPLUGINS: already active: 3: gold\n"
        );
        assert_eq!(control.bot().plugins().len(), 3);
    }

    #[tokio::test]
    async fn test_plugins_del_rejects_bad_index_without_mutation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("plugins del 1 abc").await.unwrap();
        assert_eq!(take_output(&mut control), "ERROR: need a valid plugin index\n");
        assert_eq!(active_ids(&control), [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_plugins_unknown_ids() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("plugins add 9").await.unwrap();
        control.execute("plugins del 9").await.unwrap();
        assert_eq!(take_output(&mut control), "9 not found!\n9 not found!\n");
    }

    #[tokio::test]
    async fn test_plugins_print_lists_active_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("plugins d 1").await.unwrap();
        control.execute("plugins print").await.unwrap();
        assert_eq!(take_output(&mut control), "2: corrector\n3: gold\n");
    }

    #[tokio::test]
    async fn test_sudoers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("sudo add alice").await.unwrap();
        control.execute("su a bob").await.unwrap();
        control.execute("sd rm alice").await.unwrap();
        control.execute("sudoers del alice").await.unwrap();
        assert_eq!(
            take_output(&mut control),
            "New sudo: alice\nSudoers: alice\n\
             New sudo: bob\nSudoers: alice, bob\n\
             alice is no longer a sudoer\nSudoers: bob\n\
             alice is not a sudoer\nSudoers: bob\n"
        );
        assert!(control.bot().sudoers().contains("bob"));
    }

    #[tokio::test]
    async fn test_say_goes_to_the_bot() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("say hello world").await.unwrap();
        assert_eq!(control.bot().transcript(), ["hello world"]);
    }

    #[tokio::test]
    async fn test_irc_diagnostics() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("irc 3").await.unwrap();
        control.execute("lw 0").await.unwrap();
        control.execute("w lots").await.unwrap();
        let output = take_output(&mut control);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ERROR: showing the last 3 messages"));
        assert_eq!(lines[1], "ERROR: 0 is not a valid number of messages to display");
        assert_eq!(lines[2], "ERROR: need a valid number of messages");
    }

    #[tokio::test]
    async fn test_help_lists_commands_and_plugins() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute("h").await.unwrap();
        let output = take_output(&mut control);
        assert!(output.starts_with("Commands:\n"));
        assert!(output.contains("op|operate"));
        assert!(output.contains("Plugins:\n  1: todolist: "));
    }

    #[tokio::test]
    async fn test_quit_saves_and_disconnects() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp);
        control.execute(":q").await.unwrap();
        assert!(control.is_finished());
        assert!(!control.bot().is_connected());
        assert!(tmp.path().join("gold_ledger.dat").exists());
        assert!(tmp.path().join("default_todo_list.dat").exists());
    }

    #[tokio::test]
    async fn test_run_until_eof() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = PluginStore::new(tmp.path());
        let mut control = Control::new(
            LocalBot::new("munin"),
            import_plugins(&["corrector".to_string()], &store),
            ScriptReader::new(["say hi", "nonsense"]),
            Vec::new(),
            ControlOptions {
                prompt: "> ".to_string(),
                intro: "hello".to_string(),
            },
        )
        .unwrap();

        control.run().await.unwrap();
        assert!(control.is_finished());
        assert_eq!(
            String::from_utf8(control.output().clone()).unwrap(),
            "hello\nnot a valid command\n"
        );
        assert_eq!(control.bot().transcript(), ["hi"]);
    }
}
