//! Signature qualification for extracted class bodies.
//!
//! A member function defined inside a class body is not valid C++ once the
//! body stands alone in its own file. Its name has to become
//! `ClassName::name`. This module rewrites an extracted body line by line
//! with an ordered rule table, where the first matching rule wins. Rules only
//! apply at brace depth 0 relative to the class body. Method-shaped text
//! inside a method body, a lambda or a nested type is never touched.
//!
//! The return types recognized are deliberately a closed set:
//! `const std::string&`, `std::string`, `json`, `bool`, `void`, plus bare
//! constructors. A member with any other return type is left unqualified and
//! will fail to compile downstream. Nothing here detects that.
//!
//! Body-less prototypes (`void helper();`, `= 0;`, `= default;`) are left as
//! they are: a qualified declaration is not valid outside the class. Only the
//! first line of a prototype split over several lines is seen, so such a
//! prototype still gets qualified.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::braces::{brace_delta, DepthTracker};
use crate::types::{ExtractedBody, RewrittenUnit};

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Access specifier labels seen at class level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Private,
    Protected,
}

impl Access {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "public:" => Some(Access::Public),
            "private:" => Some(Access::Private),
            "protected:" => Some(Access::Protected),
            _ => None,
        }
    }
}

/// What a matching rule does to its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    /// Replace the line with a qualified signature.
    Qualify(String),
    /// Remove a member-only line.
    Drop,
    /// Remove an access label, remembering which one it was.
    Label(Access),
}

/// One `(predicate, transform)` pair. Both receive the raw line (terminator
/// included) and the owning class name.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str, &str) -> bool,
    pub transform: fn(&str, &str) -> LineAction,
}

/// Evaluated top to bottom; the first rule whose predicate holds wins.
pub const RULES: &[Rule] = &[
    Rule { name: "constructor", matches: is_constructor, transform: qualify_constructor },
    Rule { name: "method", matches: is_method_signature, transform: qualify_method },
    Rule { name: "sync-member", matches: is_sync_member, transform: drop_line },
    Rule { name: "access-label", matches: is_access_label, transform: drop_label },
];

fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<lead>\s*(?:const\s+std::string\s*&\s*|(?:std::string|json|bool|void)\s+))(?P<name>[A-Za-z_]\w*)\s*\(",
        )
        .unwrap()
    })
}

fn sync_member_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:mutable\s+)?std::(?:mutex|recursive_mutex|shared_mutex|timed_mutex)\s+\w+\s*;\s*(?://.*)?\s*$")
            .unwrap()
    })
}

/// Byte offset of the constructor name when the line starts with
/// `<ClassName>(` after indentation.
fn constructor_name_at(line: &str, class_name: &str) -> Option<usize> {
    if is_prototype(line) {
        return None;
    }
    let indent = line.len() - line.trim_start().len();
    let rest = line[indent..].strip_prefix(class_name)?;
    rest.trim_start().starts_with('(').then_some(indent)
}

/// Byte offset of the method name in a recognized signature, unless the name
/// is the class itself (that is the constructor's rule).
fn method_name_at(line: &str, class_name: &str) -> Option<usize> {
    if is_prototype(line) {
        return None;
    }
    let caps = method_re().captures(line)?;
    let name = caps.name("name")?;
    (name.as_str() != class_name).then_some(name.start())
}

/// Declaration without a body on this line.
fn is_prototype(line: &str) -> bool {
    line.trim_end().ends_with(';')
}

fn insert_qualifier(line: &str, at: usize, class_name: &str) -> String {
    format!("{}{}::{}", &line[..at], class_name, &line[at..])
}

pub fn is_constructor(line: &str, class_name: &str) -> bool {
    constructor_name_at(line, class_name).is_some()
}

pub fn is_method_signature(line: &str, class_name: &str) -> bool {
    method_name_at(line, class_name).is_some()
}

pub fn is_sync_member(line: &str, _class_name: &str) -> bool {
    sync_member_re().is_match(line)
}

pub fn is_access_label(line: &str, _class_name: &str) -> bool {
    Access::parse(line).is_some()
}

fn qualify_constructor(line: &str, class_name: &str) -> LineAction {
    match constructor_name_at(line, class_name) {
        Some(at) => LineAction::Qualify(insert_qualifier(line, at, class_name)),
        None => LineAction::Qualify(line.to_string()),
    }
}

fn qualify_method(line: &str, class_name: &str) -> LineAction {
    match method_name_at(line, class_name) {
        Some(at) => LineAction::Qualify(insert_qualifier(line, at, class_name)),
        None => LineAction::Qualify(line.to_string()),
    }
}

fn drop_line(_line: &str, _class_name: &str) -> LineAction {
    LineAction::Drop
}

fn drop_label(line: &str, _class_name: &str) -> LineAction {
    Access::parse(line).map_or(LineAction::Drop, LineAction::Label)
}

// ---------------------------------------------------------------------------
// Rewriter
// ---------------------------------------------------------------------------

/// Streams an extracted body through [`RULES`], tracking brace depth.
pub struct Qualifier<'a> {
    class_name: &'a str,
    depth: DepthTracker,
    access: Option<Access>,
    lines: Vec<String>,
    qualified: usize,
    dropped: usize,
}

impl<'a> Qualifier<'a> {
    pub fn new(class_name: &'a str) -> Self {
        Self {
            class_name,
            depth: DepthTracker::new(),
            access: None,
            lines: Vec::new(),
            qualified: 0,
            dropped: 0,
        }
    }

    /// Start from a depth other than 0, for bodies whose opening brace sits
    /// on its own line after the declaration.
    pub fn starting_at(mut self, depth: i32) -> Self {
        self.depth.feed(&"{".repeat(depth.max(0) as usize));
        self.depth.feed(&"}".repeat((-depth).max(0) as usize));
        self
    }

    /// Last access label seen at class level. Output does not depend on it.
    pub fn access(&self) -> Option<Access> {
        self.access
    }

    pub fn push(&mut self, line: &str) {
        let action = if self.depth.at_top_level() {
            RULES.iter().find(|r| (r.matches)(line, self.class_name)).map(|r| {
                debug!(class = self.class_name, rule = r.name, line = line.trim(), "Rule matched");
                (r.transform)(line, self.class_name)
            })
        } else {
            None
        };
        self.depth.feed(line);

        match action {
            Some(LineAction::Qualify(rewritten)) => {
                self.qualified += 1;
                self.lines.push(rewritten);
            }
            Some(LineAction::Drop) => self.dropped += 1,
            Some(LineAction::Label(access)) => {
                self.access = Some(access);
                self.dropped += 1;
            }
            None => self.lines.push(line.to_string()),
        }
    }

    pub fn finish(self) -> RewrittenUnit {
        RewrittenUnit {
            class_name: self.class_name.to_string(),
            lines: self.lines,
            qualified: self.qualified,
            dropped: self.dropped,
        }
    }
}

/// Rewrite a class body (declaration and closing lines already removed).
pub fn rewrite<S: AsRef<str>>(body: &[S], class_name: &str) -> RewrittenUnit {
    let mut q = Qualifier::new(class_name);
    for line in body {
        q.push(line.as_ref());
    }
    q.finish()
}

/// Rewrite an extracted body, accounting for a declaration line that does
/// not carry the opening brace itself.
pub fn rewrite_extracted(extracted: &ExtractedBody) -> RewrittenUnit {
    let mut q = Qualifier::new(&extracted.class_name)
        .starting_at(brace_delta(&extracted.declaration) - 1);
    for line in &extracted.body {
        q.push(line);
    }
    let unit = q.finish();
    debug!(
        class = extracted.class_name.as_str(),
        qualified = unit.qualified,
        dropped = unit.dropped,
        "Rewrote class body"
    );
    unit
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn one(line: &str, class: &str) -> String {
        rewrite(&[line], class).body_text()
    }

    #[test]
    fn test_method_with_const_qualifier() {
        assert_eq!(
            one("    json getUser(int id) const {\n", "UserService"),
            "    json UserService::getUser(int id) const {\n"
        );
    }

    #[test]
    fn test_constructor_with_initializer_list() {
        assert_eq!(
            one("    OrderService() : BaseService() {\n", "OrderService"),
            "    OrderService::OrderService() : BaseService() {\n"
        );
    }

    #[test]
    fn test_each_recognized_return_type() {
        let cases = [
            ("    const std::string& getTable() const {", "    const std::string& Svc::getTable() const {"),
            ("    const std::string &getTable() const {", "    const std::string &Svc::getTable() const {"),
            ("    std::string getServiceName() const override {", "    std::string Svc::getServiceName() const override {"),
            ("    bool isValid(const json& j) const {", "    bool Svc::isValid(const json& j) const {"),
            ("    void reset() {", "    void Svc::reset() {"),
            ("    json list(int page,", "    json Svc::list(int page,"),
        ];
        for (input, expected) in cases {
            assert_eq!(one(input, "Svc"), expected, "input: {input}");
        }
    }

    #[test]
    fn test_sync_member_is_dropped() {
        let unit = rewrite(&["    std::mutex order_mutex_;\n", "    mutable std::mutex m;\n"], "OrderService");
        assert!(unit.lines.is_empty(), "got: {:?}", unit.lines);
        assert_eq!(unit.dropped, 2);
    }

    #[test]
    fn test_sync_member_with_trailing_comment_is_dropped() {
        let unit = rewrite(
            &["    std::mutex order_mutex_;  // guards orders\n", "    std::shared_mutex cache_lock_; //\r\n"],
            "OrderService",
        );
        assert!(unit.lines.is_empty(), "got: {:?}", unit.lines);
        assert!(!is_sync_member("    std::mutex* borrowed_;  // not owned\n", "OrderService"));
    }

    #[test]
    fn test_prototypes_are_not_qualified() {
        let body = [
            "    void helper();\n",
            "    virtual json describe() const = 0;\n",
            "    Svc(const Svc&) = default;\n",
            "    bool ready() const;  \n",
            "    void run() {\n",
            "    }\n",
        ];
        let unit = rewrite(&body, "Svc");
        assert_eq!(unit.qualified, 1);
        assert_eq!(&unit.lines[..4], &body[..4]);
        assert_eq!(unit.lines[4], "    void Svc::run() {\n");
    }

    #[test]
    fn test_access_labels_are_dropped_and_tracked() {
        let mut q = Qualifier::new("Svc");
        q.push("public:\n");
        q.push("    void a() {}\n");
        q.push("  private:\n");
        assert_eq!(q.access(), Some(Access::Private));
        let unit = q.finish();
        assert_eq!(unit.lines, vec!["    void Svc::a() {}\n".to_string()]);
        assert_eq!(unit.dropped, 2);
    }

    #[test]
    fn test_nested_lines_are_not_qualified() {
        let body = [
            "    json list() {\n",
            "        auto f = [this]() {\n",
            "            json inner(1);\n",
            "        };\n",
            "        void helper();\n",
            "        std::mutex local;\n",
            "        return json();\n",
            "    }\n",
            "    struct Row {\n",
            "        bool ok() const { return true; }\n",
            "    public:\n",
            "    };\n",
        ];
        let unit = rewrite(&body, "Svc");
        assert_eq!(unit.qualified, 1);
        assert_eq!(unit.lines.len(), body.len());
        assert_eq!(unit.lines[0], "    json Svc::list() {\n");
        for (got, want) in unit.lines.iter().zip(body.iter()).skip(1) {
            assert_eq!(got, want);
        }
    }

    #[test]
    fn test_already_qualified_and_unknown_types_pass_through() {
        let body = [
            "    json Other::call() {\n",
            "    }\n",
            "    int count() const {\n",
            "    }\n",
            "    // json commented(int x) {\n",
            "\n",
            "    json result = fetch(1);\n",
        ];
        let unit = rewrite(&body, "Svc");
        assert_eq!(unit.qualified, 0);
        assert_eq!(unit.body_text(), body.concat());
    }

    #[test]
    fn test_every_top_level_method_has_one_qualifier() {
        let body = [
            "public:\n",
            "    UserService() : BaseService() {}\n",
            "    json getUser(int id) const {\n",
            "        if (id < 0) {\n",
            "            return json();\n",
            "        }\n",
            "        return findUser(id);\n",
            "    }\n",
            "private:\n",
            "    std::string tableName() {\n",
            "        return \"users\";\n",
            "    }\n",
        ];
        let unit = rewrite(&body, "UserService");
        assert_eq!(unit.qualified, 3);
        for line in &unit.lines {
            let trimmed = line.trim_start();
            if trimmed.starts_with("json ") || trimmed.starts_with("std::string ") || trimmed.starts_with("UserService") {
                assert_eq!(line.matches("UserService::").count(), 1, "line: {line}");
            }
        }
    }

    #[test]
    fn test_body_with_brace_on_its_own_line() {
        let extracted = ExtractedBody {
            class_name: "Svc".into(),
            range: crate::types::ExtractionRange { start: 0, end: 4 },
            declaration: "class Svc : public BaseService\n".into(),
            body: vec!["{\n".into(), "    void run() {\n".into(), "    }\n".into()],
            closing: "};\n".into(),
        };
        let unit = rewrite_extracted(&extracted);
        assert_eq!(unit.lines[1], "    void Svc::run() {\n");
    }

    #[test]
    fn test_rule_order_is_first_match_wins() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["constructor", "method", "sync-member", "access-label"]);
        assert!(is_constructor("  Svc(int x) {", "Svc"));
        assert!(!is_constructor("  SvcHelper(int x) {", "Svc"));
        assert!(!is_method_signature("  void Svc(int x) {", "Svc"));
    }
}
