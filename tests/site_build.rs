//! End-to-end builds of small sites on disk, with real plugin programs.
//!
//! Plugins and hooks are `/bin/sh` scripts in `.zs/`, so these run on Unix
//! only. The search path is pinned to the system directories so the
//! scripts behave the same under any developer environment.

#![cfg(unix)]

use filetime::FileTime;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use zs::config::SiteConfig;
use zs::paths::SitePaths;
use zs::plugin::ProcessHost;
use zs::render::Renderer;
use zs::vars::{self, Resolver};
use zs::watch::{CycleReport, Scheduler};

struct Site {
    _tmp: TempDir,
    root: PathBuf,
}

impl Site {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        Self { _tmp: tmp, root }
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn script(&self, rel: &str, body: &str) {
        let path = self.write(rel, &format!("#!/bin/sh\n{body}\n"));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(".pub").join(rel)).unwrap()
    }

    fn published(&self, rel: &str) -> bool {
        self.root.join(".pub").join(rel).exists()
    }

    fn scheduler(&self, config: SiteConfig) -> Scheduler<ProcessHost> {
        let paths = SitePaths::new(&self.root);
        let globals = vars::globals(&config, std::iter::empty());
        let resolver = Resolver::new(paths.clone(), globals);
        let host = ProcessHost::with_search_path(paths, &OsString::from("/usr/bin:/bin"));
        let renderer = Renderer::new(&config, resolver, host).unwrap();
        Scheduler::new(renderer, config.watch.interval())
    }
}

fn built(report: &CycleReport) -> Vec<String> {
    report
        .built
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

fn blog() -> Site {
    let site = Site::new();
    site.write(
        ".zs/layout.html",
        "<title><% title %> | <% site %></title>\n<% content %>",
    );
    site.write(".zs/footer.html", "<footer>fin</footer>");
    site.script(".zs/greet", r#"printf '%s, %s' "$ZS_TITLE" "$1""#);
    site.write(
        "index.md",
        "title: Home\n---\n# Hi {{ greet world }}\n\n{{ footer }}\n",
    );
    site.write("blog/first-post.md", "Some *text*.\n");
    site.write("feed.xml", "<feed><title><% title %></title><% description %>{{ footer }}</feed>");
    site.write("img/logo.png", "\u{89}PNG");
    site
}

fn blog_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.description = "A blog".to_string();
    config.vars.insert("site".to_string(), "My Blog".to_string());
    config
}

#[test]
fn builds_markdown_templates_and_assets() {
    let site = blog();
    let report = site.scheduler(blog_config()).run_once().unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failed);
    assert_eq!(
        built(&report),
        vec!["blog/first-post.md", "feed.xml", "img/logo.png", "index.md"]
    );

    let index = site.read("index.html");
    assert!(index.starts_with("<title>Home | My Blog</title>"), "{index}");
    assert!(index.contains("<h1>Hi Home, world</h1>"), "{index}");
    assert!(index.contains("<footer>fin</footer>"), "{index}");

    let post = site.read("blog/first-post.html");
    assert!(post.starts_with("<title>First Post | My Blog</title>"), "{post}");
    assert!(post.contains("<p>Some <em>text</em>.</p>"), "{post}");

    assert_eq!(
        site.read("feed.xml"),
        "<feed><title>Feed</title>A blog<footer>fin</footer></feed>"
    );
    assert_eq!(site.read("img/logo.png"), "\u{89}PNG");
    assert!(!site.published("index.md"));
}

#[test]
fn hooks_bracket_the_builds() {
    let site = blog();
    site.script(".zs/prehook", r#"echo pre >> "$ZS_OUTDIR/hooks.log""#);
    site.script(
        ".zs/posthook",
        r#"test -f "$ZS_OUTDIR/index.html" && echo post >> "$ZS_OUTDIR/hooks.log""#,
    );

    let report = site.scheduler(blog_config()).run_once().unwrap();

    assert_eq!(report.hooks, vec!["prehook", "posthook"]);
    assert_eq!(site.read("hooks.log"), "pre\npost\n");
}

#[test]
fn second_pass_only_rebuilds_touched_files() {
    let site = blog();
    site.script(".zs/prehook", r#"echo pre >> "$ZS_OUTDIR/hooks.log""#);
    let mut scheduler = site.scheduler(blog_config());
    scheduler.run_once().unwrap();

    let idle = scheduler.run_once().unwrap();
    assert!(!idle.modified());
    assert!(idle.hooks.is_empty());

    let future = FileTime::from_unix_time(FileTime::now().unix_seconds() + 60, 0);
    filetime::set_file_mtime(site.root.join("feed.xml"), future).unwrap();
    let touched = scheduler.run_once().unwrap();
    assert_eq!(built(&touched), vec!["feed.xml"]);
    assert_eq!(site.read("hooks.log"), "pre\npre\n");
}

#[test]
fn ignore_file_and_hidden_entries_are_skipped() {
    let site = blog();
    site.write(".zsignore", "drafts/\n*.tmp\n.*\n");
    site.write("drafts/wip.md", "unfinished\n");
    site.write("notes.tmp", "scratch\n");
    site.write(".hidden.md", "secret\n");

    let report = site.scheduler(blog_config()).run_once().unwrap();

    assert!(report.reset);
    assert!(!built(&report).iter().any(|p| p.starts_with("drafts")));
    assert!(!site.published("drafts/wip.html"));
    assert!(!site.published("notes.tmp"));
    assert!(!site.published(".hidden.html"));
}

#[test]
fn broken_file_does_not_stop_the_pass() {
    let site = blog();
    site.write("broken.html", "<p>{{ never closed</p>");

    let report = site.scheduler(blog_config()).run_once().unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, Path::new("broken.html"));
    assert!(site.published("index.html"));
    assert!(site.published("img/logo.png"));
}

#[test]
fn failing_plugin_leaves_empty_substitution() {
    let site = blog();
    site.script(".zs/boom", "echo nope >&2; exit 3");
    site.write("page.html", "[{{ boom }}]");

    let report = site.scheduler(blog_config()).run_once().unwrap();

    assert!(report.is_success());
    assert_eq!(site.read("page.html"), "[]");
}

#[test]
fn production_hides_unresolved_macros() {
    let site = blog();
    site.write("page.html", "[{{ no-such-thing }}]");

    site.scheduler(blog_config()).run_once().unwrap();
    assert_eq!(
        site.read("page.html"),
        "[no-such-thing: plugin or variable not found]"
    );

    let mut production = blog_config();
    production.production = true;
    site.scheduler(production).run_once().unwrap();
    assert_eq!(site.read("page.html"), "[]");
}

#[test]
fn plugins_see_page_variables() {
    let site = blog();
    site.script(".zs/whoami", r#"printf '%s %s %s' "$ZS_URL" "$ZS_AUTHOR" "${ZS_CONTENT-unset}""#);
    site.write("about.md", "author: Ann\n---\n{{ whoami }}\n");

    site.scheduler(blog_config()).run_once().unwrap();

    assert!(site.read("about.html").contains("<p>about.html Ann unset</p>"));
}

fn zs(site: &Site, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_zs"))
        .arg("--root")
        .arg(&site.root)
        .args(args)
        .current_dir(&site.root)
        .env_remove("ZS_LOG")
        .env_remove("ZS_PRODUCTION")
        .env_remove("ZS_TITLE")
        .output()
        .unwrap()
}

#[test]
fn cli_build_and_var() {
    let site = blog();

    let build = zs(&site, &["build"]);
    assert!(build.status.success(), "{}", String::from_utf8_lossy(&build.stderr));
    assert!(String::from_utf8_lossy(&build.stdout).contains("Built 4 files"));
    assert!(site.published("blog/first-post.html"));

    let var = zs(&site, &["var", "index.md", "title", "url"]);
    assert!(var.status.success());
    assert_eq!(String::from_utf8_lossy(&var.stdout), "Home\nindex.html\n");
}

#[test]
fn cli_build_fails_when_a_file_fails() {
    let site = blog();
    site.write("broken.html", "{{ oops");

    let build = zs(&site, &["build"]);
    assert!(!build.status.success());
    assert!(String::from_utf8_lossy(&build.stdout).contains("Failed 1 file"));
}

#[test]
fn cli_gen_config_needs_no_site() {
    let site = Site::new();
    let out = zs(&site, &["gen-config"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("[watch]"), "{text}");
}
