//! Scripted mock VM shell.
//!
//! [`ShellScript`] maps command substrings to a sequence of replies. The
//! last reply of a rule repeats once the sequence is used up; commands that
//! match no rule succeed with empty output.

use std::collections::VecDeque;

use adash_core::error::{AdashError, EnvironmentError};
use adash_core::scenario::BoxFuture;
use adash_shell::{CommandChannel, CommandOutput};

use super::journal::Journal;

pub const PODS_RUNNING: &str = "\
NAME                                   READY   STATUS    RESTARTS   AGE
clickhouse-operator-6c6b8d5d8b-x2x9k   2/2     Running   0          40s
coredns-558bd4d5db-7xw8p               1/1     Running   0          5m";

pub const PODS_WITHOUT_OPERATOR: &str = "\
NAME                                   READY   STATUS    RESTARTS   AGE
coredns-558bd4d5db-7xw8p               1/1     Running   0          6m";

pub const CHI_COMPLETED: &str = "\
NAME        CLUSTERS   HOSTS   STATUS      AGE
simple-01   1          1       Completed   2m";

pub const CHI_IN_PROGRESS: &str = "\
NAME        CLUSTERS   HOSTS   STATUS       AGE
simple-01   1          1       InProgress   10s";

pub const NO_CHI: &str = "No resources found in default namespace.";

struct Rule {
    pattern: String,
    replies: VecDeque<CommandOutput>,
}

/// Replies of the mock shell, keyed by command substring.
#[derive(Default)]
pub struct ShellScript {
    rules: Vec<Rule>,
}

#[allow(dead_code)]
impl ShellScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cluster where the operator and CHI come up on the first poll and
    /// disappear on the first poll after deletion.
    pub fn healthy_cluster() -> Self {
        Self::new()
            .reply("get pods", 0, PODS_RUNNING)
            .reply("get pods", 0, PODS_WITHOUT_OPERATOR)
            .reply("get chi", 0, CHI_COMPLETED)
            .reply("get chi", 0, NO_CHI)
    }

    /// Append a reply for commands containing `pattern`.
    pub fn reply(mut self, pattern: &str, exit_status: i32, output: &str) -> Self {
        let reply = CommandOutput {
            exit_status,
            output: output.to_owned(),
        };
        match self.rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(rule) => rule.replies.push_back(reply),
            None => self.rules.push(Rule {
                pattern: pattern.to_owned(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    fn answer(&mut self, command: &str) -> CommandOutput {
        let Some(rule) = self.rules.iter_mut().find(|r| command.contains(&r.pattern)) else {
            return CommandOutput {
                exit_status: 0,
                output: String::new(),
            };
        };
        if rule.replies.len() > 1 {
            rule.replies.pop_front().expect("non-empty")
        } else {
            rule.replies.front().cloned().expect("rule has a reply")
        }
    }
}

/// Mock [`CommandChannel`] that records every command as `vm: <command>`.
pub struct MockShell {
    journal: Journal,
    script: ShellScript,
    closed: bool,
}

impl MockShell {
    pub fn new(journal: Journal, script: ShellScript) -> Self {
        Self {
            journal,
            script,
            closed: false,
        }
    }
}

impl CommandChannel for MockShell {
    fn execute<'a>(
        &'a mut self,
        command: &'a str,
    ) -> BoxFuture<'a, Result<CommandOutput, AdashError>> {
        Box::pin(async move {
            if self.closed {
                return Err(EnvironmentError::ChannelClosed("mock shell is closed".to_owned()).into());
            }
            self.journal.record(format!("vm: {command}"));
            Ok(self.script.answer(command))
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), AdashError>> {
        Box::pin(async move {
            self.closed = true;
            self.journal.record("vm: close");
            Ok(())
        })
    }
}
