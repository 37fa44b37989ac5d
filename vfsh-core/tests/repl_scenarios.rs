//! End-to-end command-line scenarios, driven through `repl::run_line`
//! exactly the way the interactive binary drives it, just without a
//! terminal. Mirrors the literal input/output pairs the VFS shell is
//! expected to produce.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use vfsh_core::commands::register_builtin_commands;
use vfsh_core::model::{ConversationMetadata, ConversationTree, Message, Role};
use vfsh_core::repository::InMemoryRepository;
use vfsh_core::{repl, Dispatcher, ShellContext};

fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("fixture timestamp is valid RFC 3339")
        .with_timezone(&Utc)
}

fn message(id: &str, role: Role, content: &str, parent: Option<&str>) -> Message {
    Message {
        id: id.to_string(),
        role,
        content: content.to_string(),
        timestamp: Some(ts("2026-02-01T00:00:00Z")),
        parent_id: parent.map(str::to_string),
    }
}

/// One conversation `abc12345` with `m1(user)="Hi"`, `m1->m1(assistant)="Hello"`,
/// `m1->m2(assistant)="Howdy"` — the exact shape the scenarios walk through.
fn scenario_repository() -> InMemoryRepository {
    let mut messages = IndexMap::new();
    for m in [
        message("root", Role::User, "Hi", None),
        message("reply-hello", Role::Assistant, "Hello", Some("root")),
        message("reply-howdy", Role::Assistant, "Howdy", Some("root")),
    ] {
        messages.insert(m.id.clone(), m);
    }

    let tree = ConversationTree {
        id: "abc12345".to_string(),
        title: Some("Greetings".to_string()),
        metadata: ConversationMetadata::default(),
        created_at: ts("2026-02-01T00:00:00Z"),
        updated_at: ts("2026-02-01T00:00:00Z"),
        messages,
        root_message_ids: vec!["root".to_string()],
    };

    let mut repo = InMemoryRepository::new();
    repo.insert(tree);
    repo
}

fn harness(repo: InMemoryRepository) -> (Dispatcher, ShellContext) {
    let mut dispatcher = Dispatcher::new();
    register_builtin_commands(&mut dispatcher);
    let ctx = ShellContext::new(Box::new(repo));
    (dispatcher, ctx)
}

#[test]
fn scenario_1_plain_echo() {
    let (dispatcher, mut ctx) = harness(InMemoryRepository::new());
    let result = repl::run_line(&dispatcher, &mut ctx, "echo Hello World");
    assert!(result.success);
    assert_eq!(result.output, "Hello World\n");
    assert_eq!(result.error, None);
}

#[test]
fn scenario_2_env_var_expansion() {
    let (dispatcher, mut ctx) = harness(InMemoryRepository::new());
    ctx.env.set("CWD", "/chats");
    ctx.env.set("MODEL", "llama3.2");
    let result = repl::run_line(&dispatcher, &mut ctx, "echo $CWD is $MODEL");
    assert!(result.success);
    assert_eq!(result.output, "/chats is llama3.2\n");
}

#[test]
fn scenario_3_three_stage_pipeline() {
    let (dispatcher, mut ctx) = harness(InMemoryRepository::new());
    let result = repl::run_line(
        &dispatcher,
        &mut ctx,
        r#"echo "line1 line2 line3" | grep line | head 2"#,
    );
    assert!(result.success);
    for line in result.output.lines() {
        assert!(line.contains("line"));
    }
}

#[test]
fn scenario_4_navigate_and_cat() {
    let (dispatcher, mut ctx) = harness(scenario_repository());

    let cd_chats = repl::run_line(&dispatcher, &mut ctx, "cd /chats/abc12345/");
    assert!(cd_chats.success);
    assert_eq!(ctx.cwd, "/chats/abc12345");
    assert_eq!(cd_chats.output, "");

    let ls_root = repl::run_line(&dispatcher, &mut ctx, "ls");
    assert!(ls_root.success);
    assert_eq!(ls_root.output, "m1/\n");

    let cd_m1 = repl::run_line(&dispatcher, &mut ctx, "cd m1");
    assert!(cd_m1.success);
    assert_eq!(ctx.cwd, "/chats/abc12345/m1");

    let ls_m1 = repl::run_line(&dispatcher, &mut ctx, "ls");
    assert!(ls_m1.success);
    for expected in ["m1/", "m2/", "text", "role", "timestamp", "id"] {
        assert!(ls_m1.output.contains(expected), "missing {expected} in {:?}", ls_m1.output);
    }

    let cat_text = repl::run_line(&dispatcher, &mut ctx, "cat text");
    assert!(cat_text.success);
    assert_eq!(cat_text.output, "Hi\n");
}

#[test]
fn scenario_5_pipeline_cat_then_grep() {
    let (dispatcher, mut ctx) = harness(scenario_repository());
    ctx.set_cwd("/chats/abc12345".to_string());

    let result = repl::run_line(&dispatcher, &mut ctx, "cat m1/m1/text | grep -i hello");
    assert!(result.success);
    assert_eq!(result.output, "Hello\n");
}

#[test]
fn scenario_6_find_by_content_and_role() {
    let (dispatcher, mut ctx) = harness(scenario_repository());
    let result = repl::run_line(&dispatcher, &mut ctx, r#"find /chats -content "Howdy" -role assistant"#);
    assert!(result.success);
    assert_eq!(result.output, "/chats/abc12345/m1/m2\n");
}

#[test]
fn cd_dotdot_from_root_is_a_no_op() {
    let (dispatcher, mut ctx) = harness(InMemoryRepository::new());
    let result = repl::run_line(&dispatcher, &mut ctx, "cd ..");
    assert!(result.success);
    assert_eq!(result.output, "Already at root\n");
    assert_eq!(ctx.cwd, "/");
}

#[test]
fn cat_with_no_args_and_empty_stdin_fails() {
    let (dispatcher, mut ctx) = harness(InMemoryRepository::new());
    let result = repl::run_line(&dispatcher, &mut ctx, "cat");
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("cat: missing operand"));
}

#[test]
fn head_zero_emits_empty_string() {
    let (dispatcher, mut ctx) = harness(InMemoryRepository::new());
    let result = repl::run_line(&dispatcher, &mut ctx, "echo one two three | head 0");
    assert!(result.success);
    assert_eq!(result.output, "");
}

#[test]
fn find_limit_zero_returns_empty_output() {
    let (dispatcher, mut ctx) = harness(scenario_repository());
    let result = repl::run_line(&dispatcher, &mut ctx, "find /chats -limit 0");
    assert!(result.success);
    assert_eq!(result.output, "");
}

#[test]
fn blank_line_is_a_no_op_end_to_end() {
    let (dispatcher, mut ctx) = harness(InMemoryRepository::new());
    let result = repl::run_line(&dispatcher, &mut ctx, "");
    assert!(result.success);
    assert_eq!(result.output, "");
}
