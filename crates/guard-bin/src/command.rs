// ============================
// crates/guard-bin/src/command.rs
// ============================
//! Line commands understood by the simulated tab.

use guard_lib::activity::ActivitySignal;
use std::str::FromStr;

/// One line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in as `email`
    Login { email: String },
    /// Create an account
    Register { email: String, password: String },
    /// Passive interaction
    Signal(ActivitySignal),
    /// Print the anti-forgery token
    Token,
    /// Submit a form carrying `token`
    Submit { token: String },
    /// Print the session state
    Status,
    /// Sign out
    Logout,
    /// Clear the login attempts of `email`
    Reset { email: String },
    /// Print the command list
    Help,
    /// Close the tab
    Quit,
}

pub const HELP: &str = "\
commands:
  login <email>               sign in (rate limited)
  register <email> <password> create an account (rate limited)
  move | key | click | scroll user activity
  token                       print the form token
  submit <token>              submit a form
  status                      show session state
  logout                      sign out
  reset <email>               clear login attempts
  help                        this text
  quit                        close the tab";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err("empty command".to_string());
        };
        let mut arg = |name: &str| {
            parts
                .next()
                .map(str::to_string)
                .ok_or_else(|| format!("{verb}: missing <{name}>"))
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "login" => Command::Login { email: arg("email")? },
            "register" => Command::Register {
                email: arg("email")?,
                password: arg("password")?,
            },
            "move" => Command::Signal(ActivitySignal::PointerMove),
            "key" => Command::Signal(ActivitySignal::KeyPress),
            "click" => Command::Signal(ActivitySignal::Click),
            "scroll" => Command::Signal(ActivitySignal::Scroll),
            "token" => Command::Token,
            "submit" => Command::Submit { token: arg("token")? },
            "status" => Command::Status,
            "logout" => Command::Logout,
            "reset" => Command::Reset { email: arg("email")? },
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command {other:?}, try `help`")),
        };
        Ok(command)
    }
}
