//! Scripted in-memory git for unit tests
//!
//! Simulates the handful of git commands the workflow issues: branches, HEAD,
//! annotated tags, staging and commits. Every call is recorded so tests can
//! assert which commands ran (and that a dry run issued no mutating ones).

use super::system_git::{git_subcommand, is_mutating};
use crate::core::runner::{CommandOutput, CommandRunner};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug)]
struct Repo {
  branches: BTreeMap<String, u32>,
  head: String,
  tags: BTreeMap<String, u32>,
  next_commit: u32,
  /// Porcelain status lines
  dirty: Vec<String>,
  staged: BTreeSet<String>,
  /// Paths recorded by each commit, oldest first
  commits: Vec<Vec<String>>,
  fail_merge: bool,
  fail_checkout: Option<String>,
  fail_push: bool,
  pushed: Vec<(String, String)>,
}

impl Repo {
  fn is_dirty(&self, path: &str) -> bool {
    self.dirty.iter().any(|line| line.get(3..) == Some(path))
  }
}

/// In-memory git standing in for the system executable
#[derive(Debug)]
pub struct FakeGit {
  repo: Mutex<Repo>,
  calls: Mutex<Vec<Vec<String>>>,
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
  CommandOutput {
    stdout: stdout.into(),
    stderr: String::new(),
    exit_code: 0,
  }
}

fn fail(code: i32, stderr: impl Into<String>) -> CommandOutput {
  CommandOutput {
    stdout: String::new(),
    stderr: stderr.into(),
    exit_code: code,
  }
}

fn sha(id: u32) -> String {
  format!("{:040x}", id)
}

/// Arguments after a `--` separator
fn pathspec<'a>(args: &[&'a str]) -> Vec<&'a str> {
  args.iter().skip_while(|a| **a != "--").skip(1).copied().collect()
}

impl FakeGit {
  /// Repository with one commit on `main`
  pub fn new() -> Self {
    let mut branches = BTreeMap::new();
    branches.insert("main".to_string(), 1);
    Self {
      repo: Mutex::new(Repo {
        branches,
        head: "main".to_string(),
        tags: BTreeMap::new(),
        next_commit: 2,
        dirty: Vec::new(),
        staged: BTreeSet::new(),
        commits: Vec::new(),
        fail_merge: false,
        fail_checkout: None,
        fail_push: false,
        pushed: Vec::new(),
      }),
      calls: Mutex::new(Vec::new()),
    }
  }

  pub fn with_branch(self, name: &str) -> Self {
    {
      let mut repo = self.repo.lock().unwrap();
      let at = repo.branches[&repo.head];
      repo.branches.insert(name.to_string(), at);
    }
    self
  }

  pub fn with_dirty(self, lines: &[&str]) -> Self {
    self.repo.lock().unwrap().dirty = lines.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn with_failing_merge(self) -> Self {
    self.repo.lock().unwrap().fail_merge = true;
    self
  }

  /// Plain `checkout <branch>` of this branch fails (`checkout -b` still works)
  pub fn with_failing_checkout(self, branch: &str) -> Self {
    self.repo.lock().unwrap().fail_checkout = Some(branch.to_string());
    self
  }

  pub fn with_failing_push(self) -> Self {
    self.repo.lock().unwrap().fail_push = true;
    self
  }

  /// Mark the work tree as changed (so `add` has something to stage)
  pub fn touch(&self, line: &str) {
    self.repo.lock().unwrap().dirty.push(line.to_string());
  }

  /// Stage `path` as if the user had run `git add` on it
  pub fn stage(&self, path: &str) {
    let mut repo = self.repo.lock().unwrap();
    repo.dirty.push(format!("A  {}", path));
    repo.staged.insert(path.to_string());
  }

  /// Paths recorded by the most recent commit
  pub fn last_commit_files(&self) -> Vec<String> {
    self.repo.lock().unwrap().commits.last().cloned().unwrap_or_default()
  }

  pub fn head_branch(&self) -> String {
    self.repo.lock().unwrap().head.clone()
  }

  pub fn head_sha(&self) -> String {
    let repo = self.repo.lock().unwrap();
    sha(repo.branches[&repo.head])
  }

  pub fn branch_names(&self) -> Vec<String> {
    self.repo.lock().unwrap().branches.keys().cloned().collect()
  }

  pub fn tag_sha(&self, tag: &str) -> Option<String> {
    self.repo.lock().unwrap().tags.get(tag).map(|id| sha(*id))
  }

  pub fn pushed(&self) -> Vec<(String, String)> {
    self.repo.lock().unwrap().pushed.clone()
  }

  pub fn calls(&self) -> Vec<Vec<String>> {
    self.calls.lock().unwrap().clone()
  }

  /// Recorded calls that would have changed the repository
  pub fn mutating_calls(&self) -> Vec<Vec<String>> {
    self
      .calls()
      .into_iter()
      .filter(|call| {
        let argv: Vec<&str> = call.iter().map(String::as_str).collect();
        is_mutating(&argv)
      })
      .collect()
  }

  fn dispatch(&self, argv: &[&str]) -> CommandOutput {
    let Some(sub) = git_subcommand(argv) else {
      return fail(1, "no subcommand");
    };
    let args: Vec<&str> = argv
      .iter()
      .skip_while(|a| **a != sub)
      .skip(1)
      .copied()
      .collect();

    let mut repo = self.repo.lock().unwrap();
    let head_id = repo.branches[&repo.head];

    match (sub, args.as_slice()) {
      ("rev-parse", ["--abbrev-ref", "HEAD"]) => ok(format!("{}\n", repo.head)),
      ("rev-parse", ["HEAD"]) => ok(format!("{}\n", sha(head_id))),
      ("rev-parse", ["--verify", "--quiet", refname]) => {
        let found = if let Some(b) = refname.strip_prefix("refs/heads/") {
          repo.branches.contains_key(b)
        } else if let Some(t) = refname.strip_prefix("refs/tags/") {
          repo.tags.contains_key(t)
        } else {
          false
        };
        if found { ok("") } else { fail(1, "") }
      }
      ("status", ["--porcelain"]) => ok(repo.dirty.iter().map(|l| format!("{}\n", l)).collect::<String>()),
      ("diff", ["--cached", "--quiet", rest @ ..]) => {
        let paths = pathspec(rest);
        let staged = if paths.is_empty() {
          !repo.staged.is_empty()
        } else {
          paths.iter().any(|p| repo.staged.contains(*p))
        };
        if staged { fail(1, "") } else { ok("") }
      }
      ("checkout", ["-b", branch]) => {
        if repo.branches.contains_key(*branch) {
          return fail(128, format!("fatal: a branch named '{}' already exists", branch));
        }
        repo.branches.insert(branch.to_string(), head_id);
        repo.head = branch.to_string();
        ok("")
      }
      ("checkout", [branch]) => {
        if repo.fail_checkout.as_deref() == Some(*branch) {
          return fail(1, "error: Your local changes to the following files would be overwritten by checkout");
        }
        if !repo.branches.contains_key(*branch) {
          return fail(1, format!("error: pathspec '{}' did not match any file(s) known to git", branch));
        }
        repo.head = branch.to_string();
        ok("")
      }
      ("add", rest) => {
        for path in pathspec(rest) {
          if repo.is_dirty(path) {
            repo.staged.insert(path.to_string());
          }
        }
        ok("")
      }
      ("commit", ["-m", _message, "--only", "--", paths @ ..]) => {
        let files: Vec<String> = paths
          .iter()
          .filter(|p| repo.staged.contains(**p))
          .map(|p| p.to_string())
          .collect();
        if files.is_empty() {
          return CommandOutput {
            stdout: "nothing to commit, working tree clean\n".to_string(),
            stderr: String::new(),
            exit_code: 1,
          };
        }
        let id = repo.next_commit;
        repo.next_commit += 1;
        let head = repo.head.clone();
        repo.branches.insert(head, id);
        for file in &files {
          repo.staged.remove(file);
        }
        repo.dirty.retain(|line| !files.iter().any(|f| line.get(3..) == Some(f.as_str())));
        repo.commits.push(files);
        ok("")
      }
      ("tag", rest) if rest.first() == Some(&"-a") => {
        let force = rest.contains(&"-f");
        let Some(tag) = rest.iter().find(|a| !a.starts_with('-')) else {
          return fail(128, "fatal: no tag name");
        };
        if repo.tags.contains_key(*tag) && !force {
          return fail(128, format!("fatal: tag '{}' already exists", tag));
        }
        repo.tags.insert(tag.to_string(), head_id);
        ok("")
      }
      ("for-each-ref", [_format, pattern]) => {
        let prefix = pattern.trim_start_matches("refs/heads/").trim_end_matches('*');
        let names: String = repo
          .branches
          .keys()
          .filter(|b| b.starts_with(prefix))
          .map(|b| format!("{}\n", b))
          .collect();
        ok(names)
      }
      ("merge", ["--abort"]) => ok(""),
      ("merge", ["--no-ff", "--no-edit", branch]) => {
        if repo.fail_merge || !repo.branches.contains_key(*branch) {
          return fail(1, "CONFLICT (content): Merge conflict in package.xml");
        }
        let id = repo.next_commit;
        repo.next_commit += 1;
        let head = repo.head.clone();
        repo.branches.insert(head, id);
        ok("")
      }
      ("push", [remote, refname]) => {
        if repo.fail_push {
          return fail(1, "error: failed to push some refs (non-fast-forward)");
        }
        repo.pushed.push((remote.to_string(), refname.to_string()));
        ok("")
      }
      _ => fail(1, format!("fake git: unsupported command: {}", argv.join(" "))),
    }
  }
}

impl CommandRunner for FakeGit {
  fn run(&self, argv: &[&str], _cwd: Option<&Path>) -> CommandOutput {
    self
      .calls
      .lock()
      .unwrap()
      .push(argv.iter().map(|s| s.to_string()).collect());
    if argv.first() != Some(&"git") {
      return fail(1, format!("executable not found: {}", argv.first().unwrap_or(&"")));
    }
    self.dispatch(argv)
  }
}
