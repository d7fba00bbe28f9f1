//! Command definitions
//!
//! The command table maps every command name the client knows to the
//! response grammar used to decode its reply. Commands with no grammar
//! (`noidle`, `close`, `kill`) never get a reply of their own.

use super::codec::encode_command;
use super::parser::Grammar;

/// One entry of the command table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,

    /// None for commands the server does not answer
    pub grammar: Option<Grammar>,
}

impl CommandSpec {
    const fn new(name: &'static str, grammar: Grammar) -> Self {
        Self { name, grammar: Some(grammar) }
    }

    const fn unanswered(name: &'static str) -> Self {
        Self { name, grammar: None }
    }
}

use super::parser::Grammar::*;

/// Every known command, grouped as in the server's reference
pub static COMMANDS: &[CommandSpec] = &[
    // Status
    CommandSpec::new("clearerror", Nothing),
    CommandSpec::new("currentsong", Object),
    CommandSpec::new("idle", List),
    CommandSpec::unanswered("noidle"),
    CommandSpec::new("status", Object),
    CommandSpec::new("stats", Object),
    // Playback options
    CommandSpec::new("consume", Nothing),
    CommandSpec::new("crossfade", Nothing),
    CommandSpec::new("random", Nothing),
    CommandSpec::new("repeat", Nothing),
    CommandSpec::new("setvol", Nothing),
    CommandSpec::new("single", Nothing),
    CommandSpec::new("volume", Nothing),
    // Playback control
    CommandSpec::new("next", Nothing),
    CommandSpec::new("pause", Nothing),
    CommandSpec::new("play", Nothing),
    CommandSpec::new("playid", Nothing),
    CommandSpec::new("previous", Nothing),
    CommandSpec::new("seek", Nothing),
    CommandSpec::new("seekid", Nothing),
    CommandSpec::new("stop", Nothing),
    // Current playlist
    CommandSpec::new("add", Nothing),
    CommandSpec::new("addid", Item),
    CommandSpec::new("clear", Nothing),
    CommandSpec::new("delete", Nothing),
    CommandSpec::new("deleteid", Nothing),
    CommandSpec::new("move", Nothing),
    CommandSpec::new("moveid", Nothing),
    CommandSpec::new("playlist", Playlist),
    CommandSpec::new("playlistfind", Songs),
    CommandSpec::new("playlistid", Songs),
    CommandSpec::new("playlistinfo", Songs),
    CommandSpec::new("playlistsearch", Songs),
    CommandSpec::new("plchanges", Songs),
    CommandSpec::new("plchangesposid", Changes),
    CommandSpec::new("shuffle", Nothing),
    CommandSpec::new("swap", Nothing),
    CommandSpec::new("swapid", Nothing),
    // Stored playlists
    CommandSpec::new("listplaylist", List),
    CommandSpec::new("listplaylistinfo", Songs),
    CommandSpec::new("listplaylists", Playlists),
    CommandSpec::new("load", Nothing),
    CommandSpec::new("playlistadd", Nothing),
    CommandSpec::new("playlistclear", Nothing),
    CommandSpec::new("playlistdelete", Nothing),
    CommandSpec::new("playlistmove", Nothing),
    CommandSpec::new("rename", Nothing),
    CommandSpec::new("rm", Nothing),
    CommandSpec::new("save", Nothing),
    // Database
    CommandSpec::new("count", Object),
    CommandSpec::new("find", Songs),
    CommandSpec::new("list", List),
    CommandSpec::new("listall", Database),
    CommandSpec::new("listallinfo", Database),
    CommandSpec::new("lsinfo", Database),
    CommandSpec::new("search", Songs),
    CommandSpec::new("update", Item),
    // Connection
    CommandSpec::unanswered("close"),
    CommandSpec::unanswered("kill"),
    CommandSpec::new("password", Nothing),
    CommandSpec::new("ping", Nothing),
    // Audio outputs
    CommandSpec::new("disableoutput", Nothing),
    CommandSpec::new("enableoutput", Nothing),
    CommandSpec::new("outputs", Outputs),
    // Reflection
    CommandSpec::new("commands", List),
    CommandSpec::new("notcommands", List),
    CommandSpec::new("tagtypes", List),
    CommandSpec::new("urlhandlers", List),
];

/// Look a command up by name
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// A command ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Table entry for this command, if the name is known
    pub fn spec(&self) -> Option<&'static CommandSpec> {
        lookup(&self.name)
    }

    /// Wire line for this command (without delimiter)
    pub fn encode(&self) -> String {
        encode_command(&self.name, &self.args)
    }
}
