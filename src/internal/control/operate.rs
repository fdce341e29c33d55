//! The `operate` menu: gold ledger operations driven by follow-up prompts.

use std::io::Write;
use std::path::Path;

use super::{
    error::{CommandError, CommandResult},
    input::{LineReader, ReadLine},
    shell::Control,
};
use crate::internal::{bot::Bot, plugin::GoldLedger};

const MENU: &str = "\t0: send gold to...\t\t1: take gold of...\t\t2: take n gold of...\n\
                    \t3: send n gold to many...\t4: create a new gold for...\n\
                    \t5: clear unused names.\t\t6: generate graph.";

impl<B: Bot, R: LineReader, W: Write + Send> Control<B, R, W> {
    /// Show the menu, read a choice and the operation's parameters, run it.
    pub(super) async fn operate(&mut self) -> CommandResult {
        let Some(plugin) = self.ledger.clone() else {
            return Err(CommandError::unsupported("no gold ledger plugin is loaded"));
        };
        if !self.bot.has_plugin(plugin.id()) {
            return Err(CommandError::unsupported(format!(
                "gold ledger plugin {} is not active",
                plugin.label()
            )));
        }
        let Some(ledger) = plugin.as_gold_ledger() else {
            return Err(CommandError::unsupported("no gold ledger plugin is loaded"));
        };

        writeln!(self.out, "{MENU}")?;
        let choice = self.ask("choice: ").await?;
        match choice.parse::<u8>() {
            Ok(0) => {
                let receiver = self.ask("Send gold to: ").await?;
                ledger.give_gold(&receiver, None)?;
                writeln!(self.out, "Gold added to {receiver}")?;
            }
            Ok(1) => {
                let donator = self.ask("Take gold of: ").await?;
                let receiver = self.ask("Send it to: ").await?;
                ledger.give_gold(&receiver, Some(&donator))?;
                writeln!(self.out, "Gold added to {receiver}")?;
            }
            Ok(2) => {
                let donator = self.ask("Take gold of: ").await?;
                let receiver = self.ask("Send it to: ").await?;
                let count = self.ask_count("nb_gold: ").await?;
                self.give_many(ledger, &receiver, Some(&donator), count)?;
            }
            Ok(3) => {
                let count = self.ask_count("nb_gold per name: ").await?;
                let receivers = self.ask("Receivers (comma separated): ").await?;
                for receiver in receivers.split(',').map(str::trim).filter(|r| !r.is_empty()) {
                    self.give_many(ledger, receiver, None, count)?;
                }
            }
            Ok(4) => {
                let count = self.ask_count("nb_gold: ").await?;
                let receiver = self.ask("Create gold for: ").await?;
                ledger.create_gold_for(&receiver, count)?;
                writeln!(self.out, "{count} given to {receiver}.")?;
            }
            Ok(5) => {
                let removed = ledger.clean_unused_names();
                tracing::debug!("{removed} unused name(s) removed from the ledger");
                writeln!(self.out, "Unused names cleaned !")?;
            }
            Ok(6) => {
                let filename = self.ask("Filename: ").await?;
                ledger.save_graph(Path::new(&filename))?;
                writeln!(self.out, "Graph saved to {filename}")?;
            }
            _ => writeln!(self.out, "w00t ?")?,
        }
        Ok(())
    }

    /// Give `count` gold one by one, stopping at the first refusal.
    fn give_many(
        &mut self,
        ledger: &dyn GoldLedger,
        receiver: &str,
        donator: Option<&str>,
        count: u32,
    ) -> CommandResult {
        for _ in 0..count {
            ledger.give_gold(receiver, donator)?;
            writeln!(self.out, "Gold added to {receiver}")?;
        }
        Ok(())
    }

    async fn ask(&mut self, prompt: &str) -> CommandResult<String> {
        self.out.flush()?;
        match self.reader.read_line(prompt).await? {
            ReadLine::Line(line) => Ok(line.trim().to_string()),
            ReadLine::Eof | ReadLine::Interrupted => {
                Err(CommandError::argument("operation cancelled"))
            }
        }
    }

    async fn ask_count(&mut self, prompt: &str) -> CommandResult<u32> {
        self.ask(prompt)
            .await?
            .parse()
            .map_err(|_| CommandError::argument("need a valid number of gold"))
    }
}

#[cfg(test)]
mod tests {
    use crate::internal::{
        bot::{Bot, LocalBot},
        control::{Control, ControlOptions, ScriptReader},
        plugin::{PluginStore, import_plugins},
    };

    fn shell(
        tmp: &tempfile::TempDir,
        kinds: &[&str],
        input: &[&str],
    ) -> Control<LocalBot, ScriptReader, Vec<u8>> {
        let store = PluginStore::new(tmp.path());
        let kinds: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
        Control::new(
            LocalBot::new("munin"),
            import_plugins(&kinds, &store),
            ScriptReader::new(input.iter().copied()),
            Vec::new(),
            ControlOptions::default(),
        )
        .unwrap()
    }

    fn output(control: &Control<LocalBot, ScriptReader, Vec<u8>>) -> String {
        String::from_utf8(control.output().clone()).unwrap()
    }

    fn balance(control: &Control<LocalBot, ScriptReader, Vec<u8>>, name: &str) -> u32 {
        control.available_plugins()[0]
            .as_gold_ledger()
            .unwrap()
            .balance(name)
    }

    #[tokio::test]
    async fn test_create_then_transfer() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp, &["gold"], &["4", "3", "alice", "2", "alice", "bob", "2"]);

        control.execute("operate").await.unwrap();
        assert_eq!(balance(&control, "alice"), 3);

        control.execute("op").await.unwrap();
        assert_eq!(balance(&control, "alice"), 1);
        assert_eq!(balance(&control, "bob"), 2);
        assert!(output(&control).contains("3 given to alice."));
        assert!(output(&control).ends_with("Gold added to bob\nGold added to bob\n"));
    }

    #[tokio::test]
    async fn test_insufficient_gold_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp, &["gold"], &["1", "carol", "dave"]);
        control.execute("op").await.unwrap();
        assert!(output(&control).ends_with("ERROR: carol has no gold to give\n"));
        assert_eq!(balance(&control, "dave"), 0);
    }

    #[tokio::test]
    async fn test_unknown_choice() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp, &["gold"], &["42"]);
        control.execute("op").await.unwrap();
        assert!(output(&control).ends_with("w00t ?\n"));
    }

    #[tokio::test]
    async fn test_graph_is_written() {
        let tmp = tempfile::TempDir::new().unwrap();
        let graph = tmp.path().join("gold.dot");
        let graph_name = graph.to_string_lossy().to_string();
        let mut control = shell(&tmp, &["gold"], &["0", "erin", "6", graph_name.as_str()]);
        control.execute("op").await.unwrap();
        control.execute("op").await.unwrap();
        assert!(graph.exists());
        assert!(output(&control).ends_with(&format!("Graph saved to {graph_name}\n")));
    }

    #[tokio::test]
    async fn test_requires_an_active_ledger() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp, &["corrector"], &[]);
        control.execute("op").await.unwrap();
        assert_eq!(output(&control), "ERROR: no gold ledger plugin is loaded\n");

        let mut control = shell(&tmp, &["gold"], &[]);
        control.bot().del_plugin(1);
        control.execute("op").await.unwrap();
        assert_eq!(
            output(&control),
            "ERROR: gold ledger plugin 1: gold is not active\n"
        );
    }

    #[tokio::test]
    async fn test_create_overflow_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(
            &tmp,
            &["gold"],
            &["4", "4294967295", "alice", "4", "1", "alice"],
        );
        control.execute("op").await.unwrap();
        control.execute("op").await.unwrap();

        assert!(output(&control).ends_with("ERROR: alice cannot hold more gold\n"));
        assert_eq!(balance(&control, "alice"), u32::MAX);
        assert!(!control.is_finished());

        control.execute("quit").await.unwrap();
        assert!(tmp.path().join("gold_ledger.dat").exists());
    }

    #[tokio::test]
    async fn test_cancelled_by_end_of_input() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut control = shell(&tmp, &["gold"], &["0"]);
        control.execute("op").await.unwrap();
        assert!(output(&control).ends_with("ERROR: operation cancelled\n"));
        assert!(!control.is_finished());
    }
}
