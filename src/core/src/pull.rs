//! Docker pull command rewriting.
//!
//! Locates the target reference of a `docker pull` / `docker image pull`
//! invocation and substitutes the rewritten reference, leaving every other
//! argument untouched and in order.

use crate::reference::{Rewrite, Rewriter};

/// Global `docker` options that consume the following argument.
const GLOBAL_VALUE_OPTIONS: &[&str] = &[
    "--config",
    "-c",
    "--context",
    "-H",
    "--host",
    "-l",
    "--log-level",
    "--tlscacert",
    "--tlscert",
    "--tlskey",
];

/// `docker pull` options that consume the following argument.
const PULL_VALUE_OPTIONS: &[&str] = &["--platform"];

/// Position of the image reference inside a pull invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullCommand {
    /// Index of the reference in the argument vector.
    pub reference_index: usize,
}

impl PullCommand {
    /// Find the pull reference in a `docker` argument vector (without argv[0]).
    ///
    /// Returns `None` for anything that is not a pull, or a pull with no
    /// reference (which `docker` will reject on its own).
    pub fn locate<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        let mut i = skip_options(args, 0, GLOBAL_VALUE_OPTIONS)?;

        match args[i].as_ref() {
            "pull" => i += 1,
            "image" => {
                let next = args.get(i + 1)?;
                if next.as_ref() != "pull" {
                    return None;
                }
                i += 2;
            }
            _ => return None,
        }

        if i >= args.len() {
            return None;
        }
        let reference_index = skip_options(args, i, PULL_VALUE_OPTIONS)?;
        Some(Self { reference_index })
    }
}

/// Skip option tokens starting at `start`; returns the index of the first
/// positional argument. A `--` ends option parsing.
fn skip_options<S: AsRef<str>>(args: &[S], start: usize, value_options: &[&str]) -> Option<usize> {
    let mut i = start;
    while i < args.len() {
        let arg = args[i].as_ref();
        if arg == "--" {
            return if i + 1 < args.len() { Some(i + 1) } else { None };
        }
        if !arg.starts_with('-') || arg == "-" {
            return Some(i);
        }
        if value_options.contains(&arg) {
            // "--platform linux/amd64": skip the value too.
            i += 2;
        } else {
            // Boolean flag or "--opt=value".
            i += 1;
        }
    }
    None
}

/// Outcome of rewriting a `docker` argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRewrite {
    /// Arguments to hand to the real `docker`.
    pub args: Vec<String>,
    /// The reference rewrite, when the invocation was a pull.
    pub rewrite: Option<Rewrite>,
}

/// Rewrite the pull reference in `args`, if any.
pub fn rewrite_pull_args<S: AsRef<str>>(args: &[S], rewriter: &Rewriter) -> PullRewrite {
    let mut out: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

    let Some(cmd) = PullCommand::locate(args) else {
        return PullRewrite {
            args: out,
            rewrite: None,
        };
    };

    let rewrite = rewriter.rewrite(&out[cmd.reference_index]);
    tracing::debug!(
        original = %rewrite.original,
        rewritten = %rewrite.rewritten,
        rule = %rewrite.rule,
        "Rewrote pull reference"
    );
    out[cmd.reference_index] = rewrite.rewritten.clone();

    PullRewrite {
        args: out,
        rewrite: Some(rewrite),
    }
}
