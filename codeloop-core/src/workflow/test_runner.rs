//! Running generated pytest suites against generated code
//!
//! The implementation and its tests are written into a scratch directory as
//! `solution.py` and `test_solution.py`, then pytest runs there under a time
//! limit.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::process::Command;

use crate::Result;

/// File the implementation is written to
pub const SOLUTION_FILE: &str = "solution.py";
/// File the tests are written to
pub const TEST_FILE: &str = "test_solution.py";

/// Results of a test run
#[derive(Debug, Clone, Default)]
pub struct TestResults {
    /// Number of tests that passed
    pub passed: u32,
    /// Number of tests that failed (including errors)
    pub failed: u32,
    /// Number of tests that were skipped
    pub skipped: u32,
    /// Duration of the test run in milliseconds
    pub duration_ms: u64,
    /// Raw output from the test run
    pub output: String,
    /// Error if the test command itself failed to execute
    pub execution_error: Option<String>,
}

impl TestResults {
    /// Create results indicating an execution error
    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            execution_error: Some(error.into()),
            ..Default::default()
        }
    }

    /// At least one test failed and the run itself worked
    pub fn is_red(&self) -> bool {
        self.execution_error.is_none() && self.failed > 0
    }

    /// All tests pass, none failed, and at least one ran
    pub fn is_green(&self) -> bool {
        self.execution_error.is_none() && self.failed == 0 && self.passed > 0
    }

    /// Check if no tests were found
    pub fn no_tests_found(&self) -> bool {
        self.execution_error.is_none() && self.passed == 0 && self.failed == 0 && self.skipped == 0
    }

    /// Pass/fail as a verdict; `None` when the run could not be judged
    pub fn verdict(&self) -> Option<bool> {
        if self.execution_error.is_some() {
            None
        } else {
            Some(self.is_green())
        }
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        if let Some(ref error) = self.execution_error {
            return format!("Execution error: {}", error);
        }
        if self.no_tests_found() {
            return "No tests found".to_string();
        }
        format!(
            "{} passed, {} failed, {} skipped ({}ms)",
            self.passed, self.failed, self.skipped, self.duration_ms
        )
    }

    /// Get total number of tests
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }

    /// Summary followed by the tail of the raw output, for feeding back to
    /// the coder
    pub fn report(&self, max_output_lines: usize) -> String {
        let lines: Vec<&str> = self.output.lines().collect();
        let tail = &lines[lines.len().saturating_sub(max_output_lines)..];
        if tail.is_empty() {
            self.summary()
        } else {
            format!("{}\n\n{}", self.summary(), tail.join("\n"))
        }
    }
}

/// Runs pytest on a solution/test pair
#[derive(Debug, Clone)]
pub struct TestRunner {
    python: String,
    timeout: Duration,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl TestRunner {
    /// Create a runner using the given Python interpreter
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the timeout for test execution
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The interpreter this runner uses
    pub fn python(&self) -> &str {
        &self.python
    }

    /// Write both files into a fresh scratch directory and run pytest there
    pub async fn run(&self, code: &str, tests: &str) -> Result<TestResults> {
        let dir = tempfile::tempdir()?;
        write_sources(dir.path(), code, tests)?;
        Ok(self.run_in(dir.path()).await)
    }

    /// Run pytest on `test_solution.py` inside `workdir`
    pub async fn run_in(&self, workdir: &Path) -> TestResults {
        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", "pytest", "--tb=short", "-p", "no:cacheprovider", TEST_FILE])
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return TestResults::with_error(format!("Failed to run tests: {}", e)),
            Err(_) => {
                return TestResults::with_error(format!(
                    "Tests timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let mut results = parse_pytest_output(&stdout);
        results.duration_ms = duration_ms;
        results.output = format!("{}\n{}", stdout, stderr).trim().to_string();

        if results.no_tests_found() && !output.status.success() {
            if stderr.contains("No module named pytest") {
                results.execution_error = Some(format!("pytest is not installed for {}", self.python));
            } else {
                // Crashed before reporting anything (e.g. syntax error on import)
                results.failed = 1;
            }
        }

        tracing::debug!(summary = %results.summary(), "pytest finished");
        results
    }
}

/// Write the solution and test files into `dir`
pub fn write_sources(dir: &Path, code: &str, tests: &str) -> Result<(PathBuf, PathBuf)> {
    let solution = dir.join(SOLUTION_FILE);
    let test_file = dir.join(TEST_FILE);
    std::fs::write(&solution, format!("{}\n", code))?;
    std::fs::write(&test_file, format!("{}\n", tests))?;
    Ok((solution, test_file))
}

fn count_pattern() -> &'static Regex {
    static COUNT: OnceLock<Regex> = OnceLock::new();
    COUNT.get_or_init(|| {
        Regex::new(r"(\d+) (passed|failed|skipped|errors?|xfailed|xpassed)")
            .expect("count pattern is valid")
    })
}

/// Parse the pytest summary line, e.g. "=== 2 passed, 1 failed in 0.12s ==="
fn parse_pytest_output(stdout: &str) -> TestResults {
    let mut results = TestResults::default();

    let Some(summary) = stdout.lines().rev().find(|line| {
        let line = line.trim().trim_matches('=').trim();
        line.contains(" in ") && count_pattern().is_match(line)
    }) else {
        return results;
    };

    for caps in count_pattern().captures_iter(summary) {
        let count: u32 = caps[1].parse().unwrap_or(0);
        match &caps[2] {
            "passed" | "xpassed" => results.passed += count,
            "failed" | "error" | "errors" => results.failed += count,
            "skipped" | "xfailed" => results.skipped += count,
            _ => {}
        }
    }

    results
}
