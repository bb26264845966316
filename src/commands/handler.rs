//! Admin Console Command Handler
//!
//! Commands are single lines of whitespace-separated words. The first word is
//! the command name (case-insensitive), the rest are its arguments.
//!
//! ## Supported Commands
//!
//! - `PING [message]` - Test the console
//! - `REVOKE key ttl_ms [value]` - Blacklist a key for `ttl_ms` milliseconds
//! - `REVOKEAT key expires_at_ms [value]` - Blacklist a key until a timestamp
//! - `CHECK key` - `1` if the key is blacklisted, `0` otherwise
//! - `LEN` - Number of blacklisted keys
//! - `HEAPLEN` - Number of entries waiting in the expiry heap
//! - `NEXT` - Earliest pending expiry, or `-1`
//! - `SWEEP` - Evict expired entries now
//! - `CLEAR` - Forget everything
//! - `INFO` - Statistics
//! - `TIME` - Current time in milliseconds
//! - `COMMAND` - List commands
//! - `QUIT` - Close the console

use crate::blacklist::{Clock, ExpiringSet, SystemClock};
use crate::commands::reply::Reply;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Executes console commands against a shared blacklist.
#[derive(Clone)]
pub struct CommandHandler {
    /// The blacklist
    set: ExpiringSet<Bytes, Bytes>,
    /// Clock used for relative expiries and TIME
    clock: Arc<dyn Clock>,
    /// Console start time for INFO
    start_time: Instant,
}

impl CommandHandler {
    /// Creates a new command handler over `set`.
    pub fn new(set: ExpiringSet<Bytes, Bytes>) -> Self {
        Self::with_clock(set, Arc::new(SystemClock))
    }

    /// Creates a new command handler reading time from `clock`.
    pub fn with_clock(set: ExpiringSet<Bytes, Bytes>, clock: Arc<dyn Clock>) -> Self {
        Self {
            set,
            clock,
            start_time: Instant::now(),
        }
    }

    /// Executes one command line and returns the reply.
    ///
    /// Returns `None` for a blank line.
    pub fn execute(&self, line: &str) -> Option<Reply> {
        let mut words = line.split_whitespace();
        let cmd = words.next()?.to_uppercase();
        let args: Vec<&str> = words.collect();

        debug!(command = %cmd, args = args.len(), "Executing console command");

        Some(self.dispatch(&cmd, &args))
    }

    /// Returns `true` if `line` is a QUIT command, whatever its arguments.
    pub fn ends_session(line: &str) -> bool {
        line.split_whitespace()
            .next()
            .is_some_and(|cmd| cmd.eq_ignore_ascii_case("QUIT"))
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, cmd: &str, args: &[&str]) -> Reply {
        match cmd {
            "PING" => self.cmd_ping(args),
            "REVOKE" => self.cmd_revoke(args),
            "REVOKEAT" => self.cmd_revokeat(args),
            "CHECK" => self.cmd_check(args),
            "LEN" => self.cmd_len(args),
            "HEAPLEN" => self.cmd_heaplen(args),
            "NEXT" => self.cmd_next(args),
            "SWEEP" => self.cmd_sweep(args),
            "CLEAR" => self.cmd_clear(args),
            "INFO" => self.cmd_info(args),
            "TIME" => Reply::integer(self.clock.now_ms() as i64),
            "COMMAND" => self.cmd_command(args),
            "QUIT" => Reply::ok(),

            // Unknown command
            _ => Reply::error(format!("ERR unknown command '{}'", cmd)),
        }
    }

    fn wrong_args(cmd: &str) -> Reply {
        Reply::error(format!(
            "ERR wrong number of arguments for '{}' command",
            cmd.to_lowercase()
        ))
    }

    fn parse_millis(raw: &str) -> Result<u64, Reply> {
        raw.parse()
            .map_err(|_| Reply::error("ERR value is not an integer or out of range"))
    }

    /// Inserts `args[0]` with optional payload `args[2]`.
    fn revoke_until(&self, args: &[&str], expires_at_ms: u64) -> Reply {
        let key = Bytes::copy_from_slice(args[0].as_bytes());
        let value = args.get(2).map(|v| Bytes::copy_from_slice(v.as_bytes()));

        self.set.insert(key, expires_at_ms, value);
        Reply::ok()
    }

    /// PING [message]
    fn cmd_ping(&self, args: &[&str]) -> Reply {
        match args {
            [] => Reply::pong(),
            [message] => Reply::bulk(message.to_string()),
            _ => Self::wrong_args("PING"),
        }
    }

    /// REVOKE key ttl_ms [value]
    fn cmd_revoke(&self, args: &[&str]) -> Reply {
        if !(2..=3).contains(&args.len()) {
            return Self::wrong_args("REVOKE");
        }

        let ttl = match Self::parse_millis(args[1]) {
            Ok(ttl) => ttl,
            Err(reply) => return reply,
        };

        self.revoke_until(args, self.clock.now_ms().saturating_add(ttl))
    }

    /// REVOKEAT key expires_at_ms [value]
    fn cmd_revokeat(&self, args: &[&str]) -> Reply {
        if !(2..=3).contains(&args.len()) {
            return Self::wrong_args("REVOKEAT");
        }

        match Self::parse_millis(args[1]) {
            Ok(expires_at_ms) => self.revoke_until(args, expires_at_ms),
            Err(reply) => reply,
        }
    }

    /// CHECK key
    fn cmd_check(&self, args: &[&str]) -> Reply {
        match args {
            [key] => Reply::integer(self.set.contains(key.as_bytes()) as i64),
            _ => Self::wrong_args("CHECK"),
        }
    }

    /// LEN
    fn cmd_len(&self, _args: &[&str]) -> Reply {
        Reply::integer(self.set.len() as i64)
    }

    /// HEAPLEN
    fn cmd_heaplen(&self, _args: &[&str]) -> Reply {
        Reply::integer(self.set.heap_len() as i64)
    }

    /// NEXT
    fn cmd_next(&self, _args: &[&str]) -> Reply {
        Reply::integer(self.set.next_expiry().map(|ms| ms as i64).unwrap_or(-1))
    }

    /// SWEEP
    fn cmd_sweep(&self, _args: &[&str]) -> Reply {
        Reply::integer(self.set.sweep() as i64)
    }

    /// CLEAR
    fn cmd_clear(&self, _args: &[&str]) -> Reply {
        self.set.clear();
        Reply::ok()
    }

    /// INFO
    fn cmd_info(&self, _args: &[&str]) -> Reply {
        let stats = self.set.stats();
        let uptime = self.start_time.elapsed().as_secs();

        let info = format!(
            "# Server\r\n\
             ttlset_version:{}\r\n\
             os:{}\r\n\
             uptime_in_seconds:{}\r\n\
             sweep_interval_ms:{}\r\n\
             \r\n\
             # Blacklist\r\n\
             keys:{}\r\n\
             heap_entries:{}\r\n\
             sweeper_armed:{}\r\n\
             \r\n\
             # Stats\r\n\
             inserted:{}\r\n\
             evicted:{}\r\n\
             sweeps:{}\r\n",
            crate::VERSION,
            std::env::consts::OS,
            uptime,
            self.set.interval().as_millis(),
            stats.keys,
            stats.heap_entries,
            stats.armed as u8,
            stats.inserted,
            stats.evicted,
            stats.sweeps,
        );

        Reply::bulk(info)
    }

    /// COMMAND
    fn cmd_command(&self, _args: &[&str]) -> Reply {
        let commands = [
            "PING", "REVOKE", "REVOKEAT", "CHECK", "LEN", "HEAPLEN", "NEXT", "SWEEP", "CLEAR",
            "INFO", "TIME", "COMMAND", "QUIT",
        ];
        Reply::bulk(commands.join("\n"))
    }
}
