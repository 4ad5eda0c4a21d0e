//! Interactive runs against small `sh` scripts.
//!
//! Each test wraps `sh` as the executable and passes a script file as the
//! base command, so `$1` inside the script is the auto-approve flag when it
//! was requested. Tests are serialized because they assert on the
//! process-wide input attachment count.

#![cfg(unix)]

use cliwrap_runner::{
    BoxedReader, InputSource, ProcessRunner, RunOptions, RunnerError, SharedBuffer, WrapperSpec,
    active_input_attachments,
};
use serial_test::serial;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Input source that answers with fixed bytes and counts how often it was opened.
struct ScriptedInput {
    answer: &'static [u8],
    opened: AtomicUsize,
}

impl ScriptedInput {
    fn new(answer: &'static [u8]) -> Arc<Self> {
        Arc::new(Self {
            answer,
            opened: AtomicUsize::new(0),
        })
    }

    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl InputSource for ScriptedInput {
    fn open(&self) -> BoxedReader {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(Cursor::new(self.answer))
    }
}

struct Fixture {
    dir: TempDir,
    runner: ProcessRunner,
    input: Arc<ScriptedInput>,
    stdout: SharedBuffer,
    stderr: SharedBuffer,
}

impl Fixture {
    fn new(answer: &'static [u8]) -> Self {
        let dir = TempDir::new().unwrap();
        let input = ScriptedInput::new(answer);
        let stdout = SharedBuffer::new();
        let stderr = SharedBuffer::new();

        let mut runner = ProcessRunner::new(WrapperSpec::new("sh", "--yes"));
        runner.add_trigger_word("Enter a value:");
        runner.set_input_source(input.clone());
        runner.set_stdout_sink(stdout.sink());
        runner.set_stderr_sink(stderr.sink());

        Self {
            dir,
            runner,
            input,
            stdout,
            stderr,
        }
    }

    fn script(&self, name: &str, body: &str) -> String {
        std::fs::write(self.dir.path().join(name), body).unwrap();
        name.to_string()
    }

    fn cwd(&self) -> &Path {
        self.dir.path()
    }
}

#[tokio::test]
#[serial]
async fn test_prompt_on_stdout_attaches_input_once() {
    let fx = Fixture::new(b"yes\n");
    let script = fx.script(
        "apply.sh",
        "printf 'Do you want to perform these actions?\\n  Enter a value: '\n\
         read answer\n\
         echo \"answer=$answer\"\n",
    );

    let result = fx
        .runner
        .execute_interactive(&script, fx.cwd(), &RunOptions::new())
        .await
        .unwrap();

    assert!(result.stdout.contains("Enter a value:"));
    assert!(result.stdout.ends_with("answer=yes\n"), "{:?}", result.stdout);
    assert_eq!(fx.input.opened(), 1);
    assert_eq!(active_input_attachments(), 0);
}

#[tokio::test]
#[serial]
async fn test_prompt_on_stderr_attaches_input() {
    let fx = Fixture::new(b"no\n");
    let script = fx.script(
        "prompt_stderr.sh",
        "printf 'Enter a value: ' >&2\n\
         read answer\n\
         echo \"answer=$answer\"\n",
    );

    let result = fx
        .runner
        .execute_interactive(&script, fx.cwd(), &RunOptions::new())
        .await
        .unwrap();

    assert_eq!(result.stdout, "answer=no\n");
    assert_eq!(result.stderr, "Enter a value: ");
    assert_eq!(fx.input.opened(), 1);
    assert_eq!(active_input_attachments(), 0);
}

#[tokio::test]
#[serial]
async fn test_repeated_prompts_reuse_the_first_attachment() {
    let fx = Fixture::new(b"first\nsecond\n");
    let script = fx.script(
        "two_prompts.sh",
        "printf 'Enter a value: '\n\
         read one\n\
         printf 'Enter a value: '\n\
         read two\n\
         echo \"$one,$two\"\n",
    );

    let result = fx
        .runner
        .execute_interactive(&script, fx.cwd(), &RunOptions::new())
        .await
        .unwrap();

    assert!(result.stdout.ends_with("first,second\n"), "{:?}", result.stdout);
    assert_eq!(fx.input.opened(), 1);
    assert_eq!(active_input_attachments(), 0);
}

#[tokio::test]
#[serial]
async fn test_non_zero_exit_rejects_without_output() {
    let fx = Fixture::new(b"");
    let script = fx.script("fail.sh", "echo 'Error: no configuration files'\nexit 1\n");

    let err = fx
        .runner
        .execute_interactive(&script, fx.cwd(), &RunOptions::new())
        .await
        .unwrap_err();

    match err {
        RunnerError::NonZeroExit { exit_code, .. } => assert_eq!(exit_code, Some(1)),
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
    assert_eq!(fx.input.opened(), 0);
    // Live forwarding already happened even though the result is discarded.
    assert_eq!(fx.stdout.contents_string(), "Error: no configuration files\n");
}

#[tokio::test]
#[serial]
async fn test_non_zero_exit_after_prompt_still_detaches() {
    let fx = Fixture::new(b"no\n");
    let script = fx.script(
        "declined.sh",
        "printf 'Enter a value: '\n\
         read answer\n\
         echo 'Apply cancelled.' >&2\n\
         exit 1\n",
    );

    let err = fx
        .runner
        .execute_interactive(&script, fx.cwd(), &RunOptions::new())
        .await
        .unwrap_err();

    assert!(err.is_non_zero_exit());
    assert_eq!(fx.input.opened(), 1);
    assert_eq!(active_input_attachments(), 0);
    assert_eq!(fx.stderr.contents_string(), "Apply cancelled.\n");
}

#[tokio::test]
#[serial]
async fn test_silent_auto_approve_appends_flag_and_skips_sinks() {
    let fx = Fixture::new(b"");
    let script = fx.script("flag.sh", "echo \"flag=$1\"\necho 'warn' >&2\n");

    let result = fx
        .runner
        .execute_interactive(
            &script,
            fx.cwd(),
            &RunOptions::new().silent(true).auto_approve(true),
        )
        .await
        .unwrap();

    assert_eq!(result.stdout, "flag=--yes\n");
    assert_eq!(result.stderr, "warn\n");
    assert!(fx.stdout.contents().is_empty());
    assert!(fx.stderr.contents().is_empty());
}

#[tokio::test]
#[serial]
async fn test_without_auto_approve_no_flag_is_passed() {
    let fx = Fixture::new(b"");
    let script = fx.script("argc.sh", "echo \"argc=$#\"\n");

    let result = fx
        .runner
        .execute_interactive(&script, fx.cwd(), &RunOptions::new().auto_approve(false))
        .await
        .unwrap();

    assert_eq!(result.stdout, "argc=0\n");
}

#[tokio::test]
#[serial]
async fn test_live_output_matches_aggregate() {
    let fx = Fixture::new(b"");
    let script = fx.script(
        "stream.sh",
        "echo 'Refreshing state...'\n\
         sleep 0.1\n\
         echo 'Warning: deprecated attribute' >&2\n\
         sleep 0.1\n\
         echo 'Apply complete! Resources: 1 added'\n",
    );

    let result = fx
        .runner
        .execute_interactive(&script, fx.cwd(), &RunOptions::new().silent(false))
        .await
        .unwrap();

    assert_eq!(
        result.stdout,
        "Refreshing state...\nApply complete! Resources: 1 added\n"
    );
    assert_eq!(result.stderr, "Warning: deprecated attribute\n");
    assert_eq!(fx.stdout.contents_string(), result.stdout);
    assert_eq!(fx.stderr.contents_string(), result.stderr);
    assert_eq!(fx.input.opened(), 0);
}

#[tokio::test]
#[serial]
async fn test_apply_and_destroy_use_their_subcommands() {
    let fx = Fixture::new(b"");
    fx.script("apply", "echo \"apply $1\"\n");
    fx.script("destroy", "echo \"destroy $1\"\n");

    let applied = fx
        .runner
        .apply(fx.cwd(), &RunOptions::new().auto_approve(true))
        .await
        .unwrap();
    let destroyed = fx
        .runner
        .destroy(fx.cwd(), &RunOptions::new())
        .await
        .unwrap();

    assert_eq!(applied.stdout, "apply --yes\n");
    assert_eq!(destroyed.stdout, "destroy \n");
}

#[tokio::test]
#[serial]
async fn test_rejected_options_spawn_nothing() {
    let fx = Fixture::new(b"");
    let marker = fx.cwd().join("spawned");
    let script = fx.script("touch.sh", "touch spawned\n");

    let err = fx
        .runner
        .execute_interactive(
            &script,
            fx.cwd(),
            &RunOptions::new().silent(true).auto_approve(false),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::ConfigurationInvalid { .. }));
    assert!(!marker.exists());
}
