//! External commands fired on governance events.
//!
//! Hooks are fire-and-forget: the child runs detached from the check path
//! and a watchdog thread kills it once its timeout elapses. Spawn failures
//! are logged, never propagated.

use std::collections::BTreeMap;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::obs;
use crate::rules::{HookSpec, HooksConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Violation,
    Override,
    Complete,
    PreCheck,
    PostCheck,
}

impl HookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HookEvent::Violation => "on_violation",
            HookEvent::Override => "on_override",
            HookEvent::Complete => "on_complete",
            HookEvent::PreCheck => "pre_check",
            HookEvent::PostCheck => "post_check",
        }
    }
}

/// Variables available to `${name}` placeholders in hook arguments.
pub type HookVars = BTreeMap<&'static str, String>;

#[derive(Debug, Clone, Default)]
pub struct HookRunner {
    hooks: HooksConfig,
}

impl HookRunner {
    pub fn new(hooks: HooksConfig) -> Self {
        Self { hooks }
    }

    pub fn spec(&self, event: HookEvent) -> Option<&HookSpec> {
        let spec = match event {
            HookEvent::Violation => &self.hooks.on_violation,
            HookEvent::Override => &self.hooks.on_override,
            HookEvent::Complete => &self.hooks.on_complete,
            HookEvent::PreCheck => &self.hooks.pre_check,
            HookEvent::PostCheck => &self.hooks.post_check,
        };
        spec.as_ref().filter(|s| !s.command.is_empty())
    }

    /// Spawn the hook for `event`, if one is configured.
    pub fn fire(&self, event: HookEvent, vars: &HookVars) {
        let Some(spec) = self.spec(event) else {
            return;
        };
        let args = expand_args(&spec.args, vars);
        obs::emit_hook_fired(event.as_str(), &spec.command);

        let child = Command::new(&spec.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match child {
            Ok(child) => watch(child, Duration::from_secs(spec.timeout.max(1)), event),
            Err(e) => obs::emit_hook_failed(event.as_str(), &e),
        }
    }
}

fn watch(mut child: Child, timeout: Duration, event: HookEvent) {
    thread::spawn(move || {
        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    obs::emit_hook_failed(event.as_str(), &"timed out");
                    return;
                }
                Ok(None) => thread::sleep(Duration::from_millis(25)),
                Err(e) => {
                    obs::emit_hook_failed(event.as_str(), &e);
                    return;
                }
            }
        }
    });
}

/// Replace `${name}` in each argument. Unknown names are left as written.
pub fn expand_args(args: &[String], vars: &HookVars) -> Vec<String> {
    args.iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("${{{name}}}"), value)
            })
        })
        .collect()
}
