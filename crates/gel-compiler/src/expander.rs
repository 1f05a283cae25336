//! The expansion state machine.
//!
//! A pass walks the node sequence once, front to back, keeping the current
//! namespace and the currently open block in a [`PassContext`]. Each node
//! gets its emitted text from the first rule that applies:
//!
//! 1. a namespace change injects the schema header,
//! 2. blank lines are skipped,
//! 3. a top-level line closes the open block (and is consumed by it),
//! 4. openers start a block,
//! 5. `exec!` and `|>` are expanded inside `proc!` blocks,
//! 6. continuation lines get scope rewriting,
//! 7. everything else passes through with an origin comment.
//!
//! A block still open after the last node is closed by a synthetic
//! end-of-stream node appended to the sequence.

use crate::rules;
use gel_core::{
    BlockState, Classifier, MatchMode, Node, NoopSubscriber, Rule, Subscriber, TraceEvent,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tunables for an expansion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderOptions {
    /// How markers are located in a line.
    pub match_mode: MatchMode,
    /// Close an open block when the namespace changes instead of letting it
    /// run on into the next file. The closer is emitted before the next
    /// namespace's schema header.
    pub close_at_namespace_boundary: bool,
}

/// Mutable state of a single pass.
#[derive(Debug, Clone, Default)]
pub struct PassContext {
    current_namespace: String,
    current_state: BlockState,
    namespaces: Vec<String>,
    nodes: usize,
    blocks_opened: usize,
    blocks_closed: usize,
}

impl PassContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_namespace(&self) -> &str {
        &self.current_namespace
    }

    pub fn current_state(&self) -> BlockState {
        self.current_state
    }

    fn close(&mut self) -> &'static str {
        let closing = self.current_state.closing();
        if self.current_state.is_open() {
            self.blocks_closed += 1;
        }
        self.current_state = BlockState::Start;
        closing
    }

    fn summary(&self, forced_close: bool) -> ExpansionSummary {
        ExpansionSummary {
            nodes: self.nodes,
            namespaces: self.namespaces.clone(),
            blocks_opened: self.blocks_opened,
            blocks_closed: self.blocks_closed,
            forced_close,
        }
    }
}

/// What a pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExpansionSummary {
    /// Real nodes visited, not counting the end-of-stream node.
    pub nodes: usize,
    /// Namespaces in the order their headers were emitted.
    pub namespaces: Vec<String>,
    pub blocks_opened: usize,
    pub blocks_closed: usize,
    /// Whether an end-of-stream node had to be appended.
    pub forced_close: bool,
}

/// Runs expansion passes over node sequences.
pub struct Expander {
    options: ExpanderOptions,
    classifier: Classifier,
    subscriber: Box<dyn Subscriber>,
}

impl Expander {
    pub fn new(options: ExpanderOptions) -> Self {
        Self {
            options,
            classifier: Classifier::new(options.match_mode),
            subscriber: Box::new(NoopSubscriber),
        }
    }

    /// Report every rule firing to `subscriber`.
    pub fn with_subscriber(mut self, subscriber: Box<dyn Subscriber>) -> Self {
        self.subscriber = subscriber;
        self
    }

    pub fn options(&self) -> &ExpanderOptions {
        &self.options
    }

    /// Expand every node in place.
    ///
    /// If a block is still open at the end, one end-of-stream node holding
    /// the closer is pushed onto `nodes`.
    pub fn expand(&self, nodes: &mut Vec<Node>) -> ExpansionSummary {
        let mut ctx = PassContext::new();

        for node in nodes.iter_mut() {
            self.step(&mut ctx, node);
        }

        let eos = self.finish(&mut ctx);
        let forced_close = eos.is_some();
        nodes.extend(eos);

        self.subscriber.on_complete();
        ctx.summary(forced_close)
    }

    /// Apply the first matching rule to one node.
    pub fn step(&self, ctx: &mut PassContext, node: &mut Node) {
        ctx.nodes += 1;

        if node.namespace() != ctx.current_namespace {
            if self.options.close_at_namespace_boundary && ctx.current_state.is_open() {
                let closing = ctx.close();
                node.push_emitted(closing);
                self.trace(ctx, node, Rule::CloseBlock, closing);
            }

            let header = rules::schema_header(node.namespace());
            node.push_emitted(&header);
            ctx.current_namespace = node.namespace().to_string();
            ctx.namespaces.push(ctx.current_namespace.clone());
            self.trace(ctx, node, Rule::SchemaHeader, &header);
        }

        if node.is_empty() {
            self.trace(ctx, node, Rule::SkipEmpty, "");
            return;
        }

        // A top-level line ends the open block. The line itself is consumed
        // by the closer and is not considered as an opener.
        if !node.is_whitespace_leading() && ctx.current_state.is_open() {
            let closing = ctx.close();
            node.push_emitted(closing);
            self.trace(ctx, node, Rule::CloseBlock, closing);
            return;
        }

        let class = node.classify(&self.classifier);

        if ctx.current_state == BlockState::Start {
            if let Some((token, state)) = rules::OPENERS.iter().find(|(tok, _)| class.has(*tok)) {
                let text = rules::open_block(node.raw(), &ctx.current_namespace, *token, *state);
                ctx.current_state = *state;
                ctx.blocks_opened += 1;
                self.emit(ctx, node, Rule::OpenBlock, text);
                return;
            }
        }

        if ctx.current_state == BlockState::ImmutableProcedure {
            if class.exec {
                let text = rules::expand_exec(node.raw());
                self.emit(ctx, node, Rule::ExecMacro, text);
                return;
            }
            if class.query {
                let text = rules::expand_query(node.raw());
                self.emit(ctx, node, Rule::QueryMacro, text);
                return;
            }
        }

        if node.is_newline() {
            self.trace(ctx, node, Rule::Passthrough, "");
            return;
        }

        if rules::has_continuation(node.raw()) {
            let text = rules::expand_scope(node.raw(), &ctx.current_namespace);
            self.emit(ctx, node, Rule::ScopeMacro, text);
        } else {
            let text = rules::expand_default(node.raw(), &ctx.current_namespace, node.position());
            self.emit(ctx, node, Rule::Default, text);
        }
    }

    /// Close a block left open after the last node.
    pub fn finish(&self, ctx: &mut PassContext) -> Option<Node> {
        if !ctx.current_state.is_open() {
            return None;
        }

        let mut node = Node::end_of_stream();
        let closing = ctx.close();
        node.set_emitted(closing);
        self.trace(ctx, &node, Rule::EndOfStream, closing);
        Some(node)
    }

    fn emit(&self, ctx: &PassContext, node: &mut Node, rule: Rule, text: String) {
        node.push_emitted(&text);
        self.trace(ctx, node, rule, &text);
    }

    fn trace(&self, ctx: &PassContext, node: &Node, rule: Rule, emitted: &str) {
        debug!(
            namespace = node.namespace(),
            position = node.position(),
            rule = %rule,
            state = %ctx.current_state,
            "expanded line"
        );
        self.subscriber.on_trace(TraceEvent {
            namespace: node.namespace().to_string(),
            position: node.position(),
            rule,
            state: ctx.current_state,
            emitted: emitted.to_string(),
        });
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new(ExpanderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::emit;
    use gel_core::SourceUnit;

    fn nodes(units: &[(&str, &str)]) -> Vec<Node> {
        units
            .iter()
            .flat_map(|(name, text)| SourceUnit::from_text(name, text).into_nodes())
            .collect()
    }

    fn emitted(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(Node::emitted).collect()
    }

    const HEADER_MATH: &str = "drop schema if exists math cascade;\ncreate schema math;\n";

    #[test]
    fn test_immutable_function_opener() {
        let mut ctx = PassContext::new();
        let expander = Expander::default();
        let mut nodes = nodes(&[(
            "math.sql",
            "func! add(a int, b int) returns int as $body$ return a+b; $body$",
        )]);

        expander.step(&mut ctx, &mut nodes[0]);

        assert_eq!(ctx.current_state(), BlockState::ImmutableFunction);
        assert_eq!(ctx.current_namespace(), "math");
        assert_eq!(
            nodes[0].emitted(),
            format!(
                "{HEADER_MATH}CREATE OR REPLACE function math.add(a int, b int) returns int as $body$ return a+b; $body$\n\
                 LANGUAGE sql AS $$"
            )
        );
    }

    #[test]
    fn test_function_block_closed_by_top_level_line() {
        let mut nodes = nodes(&[(
            "math.sql",
            "func one() returns int as\n  select 1;\n-- end of one\nselect 2;",
        )]);
        let summary = Expander::default().expand(&mut nodes);
        let opener = format!(
            "{HEADER_MATH}CREATE OR REPLACE function math.one() returns int as\nLANGUAGE sql AS $$"
        );

        assert_eq!(
            emitted(&nodes),
            vec![
                opener.as_str(),
                "  select 1; -- math:2",
                "$$ IMMUTABLE; \n",
                "select 2; -- math:4",
            ]
        );
        assert_eq!(summary.blocks_opened, 1);
        assert_eq!(summary.blocks_closed, 1);
        assert!(!summary.forced_close);
    }

    #[test]
    fn test_closing_line_is_not_reopened() {
        let mut nodes = nodes(&[("math.sql", "func a()\n  select 1;\nfunc b()\n  select 2;")]);
        let summary = Expander::default().expand(&mut nodes);

        assert_eq!(nodes[2].emitted(), "$$ IMMUTABLE; \n");
        assert_eq!(nodes[3].emitted(), "  select 2; -- math:4");
        assert_eq!(summary.blocks_opened, 1);
        assert_eq!(nodes.len(), 4);
    }

    #[test]
    fn test_unterminated_procedure_is_force_closed() {
        let mut nodes = nodes(&[("jobs.sql", "proc! run()\n  x int;")]);
        let summary = Expander::default().expand(&mut nodes);

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2].emitted(), "END; $$ ; \n");
        assert_eq!(nodes[2].position(), 0);
        assert!(summary.forced_close);
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.blocks_opened, summary.blocks_closed);
    }

    #[test]
    fn test_inline_macros_only_inside_immutable_procedure() {
        let source = "proc! refresh(t text)\n  \
                      |> q := 'select * from t where id = {{id}} and name = #{{name}}';\n  \
                      exec! q;\n\
                      proc plain()\n  \
                      exec! q;";
        let mut nodes = nodes(&[("jobs.sql", source)]);
        Expander::default().expand(&mut nodes);

        assert_eq!(
            nodes[1].emitted(),
            "  q := ' select * from t where id = '||id||' and name = '''||name||'''';"
        );
        assert_eq!(nodes[2].emitted(), "  EXECUTE  q;");
        // Top-level opener closes the proc! block and is consumed.
        assert_eq!(nodes[3].emitted(), "END; $$ ; \n");
        // Back at START, exec! is not expanded.
        assert_eq!(nodes[4].emitted(), "  exec! q; -- jobs:5");
    }

    #[test]
    fn test_query_macro_not_expanded_in_plain_procedure() {
        let mut nodes = nodes(&[("jobs.sql", "proc run()\n  |> select {{id}};")]);
        Expander::default().expand(&mut nodes);

        assert_eq!(nodes[1].emitted(), "  |> select {{id}}; -- jobs:2");
        assert_eq!(nodes[2].emitted(), "END; $$ IMMUTABLE; \n");
    }

    #[test]
    fn test_scope_macro_on_continuation_lines() {
        let mut nodes = nodes(&[(
            "app.sql",
            "proc load()\n  select * from this.users where id = getv('id') \\",
        )]);
        Expander::default().expand(&mut nodes);

        assert_eq!(
            nodes[1].emitted(),
            "  select * from app.users where id = vars.getv('id') \\"
        );
    }

    #[test]
    fn test_empty_lines_emit_nothing() {
        let mut nodes = nodes(&[("math.sql", "select 1;\n\n   \nselect 2;")]);
        Expander::default().expand(&mut nodes);

        assert_eq!(nodes[1].emitted(), "");
        assert_eq!(nodes[2].emitted(), "");
        assert_eq!(nodes[3].emitted(), "select 2; -- math:4");
    }

    #[test]
    fn test_header_on_empty_first_line() {
        let mut nodes = nodes(&[("math.sql", "\nselect 1;")]);
        Expander::default().expand(&mut nodes);

        assert_eq!(nodes[0].emitted(), HEADER_MATH);
        assert_eq!(nodes[1].emitted(), "select 1; -- math:2");
    }

    #[test]
    fn test_one_header_per_namespace_in_order() {
        let mut nodes = nodes(&[
            ("math.sql", "select 1;\nselect 2;"),
            ("text.sql", "select 3;"),
        ]);
        let summary = Expander::default().expand(&mut nodes);
        let out = emit(&nodes);

        assert_eq!(summary.namespaces, vec!["math", "text"]);
        assert_eq!(out.matches("create schema math;").count(), 1);
        assert_eq!(out.matches("create schema text;").count(), 1);
        assert!(nodes[2]
            .emitted()
            .starts_with("drop schema if exists text cascade;\ncreate schema text;\nselect 3;"));
        assert!(out.find("create schema math;") < out.find("create schema text;"));
    }

    #[test]
    fn test_block_bleeds_into_next_namespace_by_default() {
        let mut nodes = nodes(&[("a.sql", "func f()\n  select 1;"), ("b.sql", "  select 2;")]);
        let summary = Expander::default().expand(&mut nodes);

        // Whitespace-leading first line of b.sql is still in a's block.
        assert_eq!(
            nodes[2].emitted(),
            "drop schema if exists b cascade;\ncreate schema b;\n  select 2; -- b:1"
        );
        assert_eq!(nodes[3].emitted(), "$$ IMMUTABLE; \n");
        assert!(summary.forced_close);
    }

    #[test]
    fn test_close_at_namespace_boundary() {
        let options = ExpanderOptions {
            close_at_namespace_boundary: true,
            ..Default::default()
        };
        let mut nodes = nodes(&[("a.sql", "func f()\n  select 1;"), ("b.sql", "  select 2;")]);
        let summary = Expander::new(options).expand(&mut nodes);

        assert_eq!(
            nodes[2].emitted(),
            "$$ IMMUTABLE; \ndrop schema if exists b cascade;\ncreate schema b;\n  select 2; -- b:1"
        );
        assert_eq!(nodes.len(), 3);
        assert!(!summary.forced_close);
        assert_eq!(summary.blocks_closed, 1);
    }

    #[test]
    fn test_strict_markers_skip_embedded_keywords() {
        let source = "select myfunc(1);";
        let mut loose = nodes(&[("math.sql", source)]);
        Expander::default().expand(&mut loose);
        assert!(loose[0].emitted().contains("CREATE OR REPLACE"));

        let options = ExpanderOptions {
            match_mode: MatchMode::Word,
            ..Default::default()
        };
        let mut strict = nodes(&[("math.sql", source)]);
        Expander::new(options).expand(&mut strict);
        assert_eq!(
            strict[0].emitted(),
            format!("{HEADER_MATH}select myfunc(1); -- math:1")
        );
    }

    #[test]
    fn test_strict_markers_expand_glued_macros() {
        let options = ExpanderOptions {
            match_mode: MatchMode::Word,
            ..Default::default()
        };
        let mut nodes = nodes(&[(
            "jobs.sql",
            "proc! run()\n  exec!stmt;\n  |>select {{id}};",
        )]);
        Expander::new(options).expand(&mut nodes);

        assert_eq!(nodes[1].emitted(), "  EXECUTE stmt;");
        assert_eq!(nodes[2].emitted(), "  |>select ' ||id||';");
    }

    #[test]
    fn test_opener_precedence() {
        let mut nodes = nodes(&[("math.sql", "proc! p() -- calls func helper")]);
        Expander::default().expand(&mut nodes);

        // func is checked before proc!, so the function marker wins.
        assert!(nodes[0].emitted().ends_with("LANGUAGE sql AS $$"));
    }

    #[test]
    fn test_every_opened_block_closes_once() {
        let sources = [
            ("a.sql", "func! f()\n  select 1;\nproc p()\n  x int;\n-- sep\nproc! q()\n  exec! x;"),
            ("b.sql", "  select 1;\nfunc g()\n\n  select 2;\n"),
        ];
        let mut nodes = nodes(&sources);
        let summary = Expander::default().expand(&mut nodes);
        let out = emit(&nodes);

        let openers = out.matches("CREATE OR REPLACE").count();
        let closers = out.matches("$$ IMMUTABLE; \n").count() + out.matches("$$ ; \n").count();
        assert_eq!(openers, summary.blocks_opened);
        assert_eq!(openers, closers);
        assert_eq!(summary.blocks_opened, summary.blocks_closed);
    }
}
