use chrono::Local;
use std::fmt::Display;

#[derive(Clone, Debug)]
pub struct Message {
    pub timestamp: String,
    pub message: String,
}

impl Message {
    fn now(msg: &str) -> Self {
        Self {
            timestamp: format!("{}", Local::now().format("[ %d:%m:%Y | %H:%M:%S ]")),
            message: msg.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum LogMsg {
    Err(Message),
    Ok(Message),
    Info(Message),
}

impl LogMsg {
    pub fn info(msg: &str) -> LogMsg {
        Self::Info(Message::now(msg))
    }

    pub fn err(msg: &str) -> LogMsg {
        Self::Err(Message::now(msg))
    }

    pub fn ok(msg: &str) -> LogMsg {
        Self::Ok(Message::now(msg))
    }

    fn inner(&self) -> &Message {
        match self {
            Self::Ok(v) | Self::Info(v) | Self::Err(v) => v,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.inner().timestamp
    }

    pub fn message(&self) -> &str {
        &self.inner().message
    }

    /// Shorten the message to at most `len` characters.
    pub fn truncate(&mut self, len: usize) {
        let msg = match self {
            Self::Ok(v) | Self::Info(v) | Self::Err(v) => &mut v.message,
        };
        if let Some((idx, _)) = msg.char_indices().nth(len) {
            msg.truncate(idx);
        }
    }
}

impl Display for LogMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            Self::Ok(_) => "OK",
            Self::Info(_) => "INFO",
            Self::Err(_) => "ERROR",
        };
        write!(f, "{} {:<5} {}", self.timestamp(), level, self.message())
    }
}
