//! External converter invocation.
//!
//! Conversions edit a file in place by running a command line of the form
//! `<binary> <parameters...> [<caption flag> <caption text>] <path> <path>`.
//! Failures are logged and swallowed: a broken converter never aborts the
//! store or caption operation that asked for it.

use photos_error::{ConvertError, ConvertErrorKind};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Caption text together with the flag token that introduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caption<'a> {
    /// Flag token, e.g. `-annotate`
    pub flag: &'a str,
    /// Text burned into the file
    pub text: &'a str,
}

/// A single conversion request.
#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    /// Tool to run
    pub binary: &'a str,
    /// Positional arguments placed before the caption and paths
    pub parameters: &'a [String],
    /// Optional caption
    pub caption: Option<Caption<'a>>,
    /// Optional upper bound on runtime
    pub timeout: Option<Duration>,
}

impl Conversion<'_> {
    /// Full argument vector (without the binary) for `path`.
    pub fn args(&self, path: &Path) -> Vec<String> {
        let target = path.to_string_lossy().to_string();
        let mut args = self.parameters.to_vec();
        if let Some(caption) = self.caption {
            args.push(caption.flag.to_string());
            args.push(caption.text.to_string());
        }
        args.push(target.clone());
        args.push(target);
        args
    }
}

/// Runs conversions against stored files.
///
/// Implementations must not fail the caller: any error is reported through
/// the log only. The call completes once the conversion attempt is over.
#[async_trait::async_trait]
pub trait Converter: Send + Sync {
    /// Convert `path` in place.
    async fn convert(&self, path: &Path, conversion: Conversion<'_>);
}

/// Converter that spawns the configured tool as a subprocess.
#[derive(Debug, Clone, Default)]
pub struct CommandConverter;

impl CommandConverter {
    /// Create a new subprocess converter.
    pub fn new() -> Self {
        Self
    }

    /// Run the tool, returning its error instead of logging it.
    pub async fn run(&self, path: &Path, conversion: Conversion<'_>) -> Result<(), ConvertError> {
        let args = conversion.args(path);
        let mut command = Command::new(conversion.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            ConvertError::new(ConvertErrorKind::Spawn {
                binary: conversion.binary.to_string(),
                reason: e.to_string(),
            })
        })?;

        let output = match conversion.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    ConvertError::new(ConvertErrorKind::Timeout {
                        binary: conversion.binary.to_string(),
                        seconds: limit.as_secs(),
                    })
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| {
            ConvertError::new(ConvertErrorKind::Spawn {
                binary: conversion.binary.to_string(),
                reason: e.to_string(),
            })
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::trace!(stdout = %stdout, stderr = %stderr, "Converter output");

        if !output.status.success() {
            return Err(ConvertError::new(ConvertErrorKind::ExitStatus {
                binary: conversion.binary.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            }));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Converter for CommandConverter {
    #[tracing::instrument(
        skip(self, conversion),
        fields(
            path = %path.display(),
            binary = conversion.binary,
            captioned = conversion.caption.is_some()
        )
    )]
    async fn convert(&self, path: &Path, conversion: Conversion<'_>) {
        match self.run(path, conversion).await {
            Ok(()) => tracing::debug!("Converted file"),
            Err(e) => tracing::error!(error = %e, "Conversion failed, keeping file unchanged"),
        }
    }
}
