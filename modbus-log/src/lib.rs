mod msg;

pub use msg::{LogMsg, Message};

/// Bounded log of messages.
///
/// Holds at most `LOG_SIZE - 1` messages, each truncated to `MAX_LINE_LENGTH` characters. Once
/// full, writing a new message drops the oldest one.
pub struct Log<const MAX_LINE_LENGTH: usize, const LOG_SIZE: usize> {
    buffer: Vec<Option<LogMsg>>,
    write: usize,
    read: usize,
}

impl<const MAX_LINE_LENGTH: usize, const LOG_SIZE: usize> Default
    for Log<MAX_LINE_LENGTH, LOG_SIZE>
{
    fn default() -> Self {
        Self::init()
    }
}

impl<const MAX_LINE_LENGTH: usize, const LOG_SIZE: usize> Log<MAX_LINE_LENGTH, LOG_SIZE> {
    pub fn init() -> Self {
        Self {
            buffer: vec![None; LOG_SIZE],
            write: 0,
            read: 0,
        }
    }

    pub fn write(&mut self, mut msg: LogMsg) {
        msg.truncate(MAX_LINE_LENGTH);
        self.buffer[self.write] = Some(msg);
        let next = (self.write + 1) % LOG_SIZE;
        if next == self.read {
            self.buffer[self.read] = None;
            self.read = (self.read + 1) % LOG_SIZE;
        }
        self.write = next;
    }

    pub fn len(&self) -> usize {
        (self.write + LOG_SIZE - self.read) % LOG_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    pub fn peak(&self) -> Option<&LogMsg> {
        if self.is_empty() {
            None
        } else {
            self.buffer[self.read].as_ref()
        }
    }

    pub fn peak_n(&self, cnt: usize) -> Option<Vec<&LogMsg>> {
        let mut read = self.read;
        let mut msgs = Vec::with_capacity(cnt);
        while read != self.write && msgs.len() < cnt {
            if let Some(msg) = self.buffer[read].as_ref() {
                msgs.push(msg);
            }
            read = (read + 1) % LOG_SIZE;
        }
        if msgs.is_empty() { None } else { Some(msgs) }
    }

    pub fn take(&mut self) -> Option<LogMsg> {
        if self.is_empty() {
            return None;
        }
        let msg = self.buffer[self.read].take();
        self.read = (self.read + 1) % LOG_SIZE;
        msg
    }

    pub fn take_n(&mut self, cnt: usize) -> Option<Vec<LogMsg>> {
        let mut msgs = Vec::with_capacity(cnt);
        while msgs.len() < cnt {
            match self.take() {
                Some(msg) => msgs.push(msg),
                None => break,
            }
        }
        if msgs.is_empty() { None } else { Some(msgs) }
    }
}
