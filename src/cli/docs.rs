//! Documentation content for the trellis CLI

use super::CliError;

/// Available documentation topics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocTopic {
    Values,
    Expressions,
    Operators,
    Paths,
    Queries,
    Pruning,
}

impl DocTopic {
    pub const ALL: [DocTopic; 6] = [
        DocTopic::Values,
        DocTopic::Expressions,
        DocTopic::Operators,
        DocTopic::Paths,
        DocTopic::Queries,
        DocTopic::Pruning,
    ];

    /// Parse a topic name, accepting a few aliases
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "values" | "value" | "types" => Some(Self::Values),
            "expressions" | "expression" | "expr" => Some(Self::Expressions),
            "operators" | "ops" => Some(Self::Operators),
            "paths" | "path" => Some(Self::Paths),
            "queries" | "query" | "predicates" => Some(Self::Queries),
            "pruning" | "prune" | "trees" => Some(Self::Pruning),
            _ => None,
        }
    }

    fn content(self) -> &'static str {
        match self {
            Self::Values => VALUES_DOC,
            Self::Expressions => EXPRESSIONS_DOC,
            Self::Operators => OPERATORS_DOC,
            Self::Paths => PATHS_DOC,
            Self::Queries => QUERIES_DOC,
            Self::Pruning => PRUNING_DOC,
        }
    }
}

/// Get the docs overview (topic listing)
pub fn get_docs_overview() -> &'static str {
    r#"TRELLIS DOCUMENTATION

Trellis evaluates typed expressions against annotated documents, selects
values by path, and prunes documents down to the parts a set of paths names.

DOCUMENTATION TOPICS

  values        Document kinds, typed nulls, annotations and the text form
  expressions   Literals, selections, existence and type checks
  operators     Arithmetic, comparison, logical and string operators
  paths         Path syntax: names, indices, wildcards, optional steps
  queries       Multi-valued paths with predicates
  pruning       Data trees, required paths and provenance annotations

COMMANDS

  trellis eval '<expr>'        Evaluate an expression
  trellis select '<path>'      Select one value (--all for queries)
  trellis prune '<paths>'      Prune a document (--validate to only check)
  trellis check '<expr>'       Parse and kind-check without evaluating

Input is read from --input or stdin, in the native text form or as JSON
with --json.
"#
}

/// Get documentation for one topic
pub fn get_doc_topic(topic: &str) -> Result<&'static str, CliError> {
    DocTopic::from_name(topic)
        .map(DocTopic::content)
        .ok_or_else(|| CliError::UnknownTopic(topic.to_string()))
}

const VALUES_DOC: &str = r#"VALUES - Document kinds and text form

KINDS
  null bool int float decimal timestamp duration string
  symbol (identifier) quoted_symbol blob clob list sexp struct

  Every kind has a typed null:  null.int  null.struct  null.string

TEXT FORM
  42  -7  2.5  1.5e3  12.50d0  true  null
  2024-03-01T10:00:00Z  2024-03-01  2024-03T  2024T
  P1DT2H  PT30S  P2W  -PT1M
  "text"  name  'quoted symbol'
  {{aGVsbG8=}}   blob (base64)
  {{"text"}}     clob
  [1, 2]  (a b c)  {name: "x", 'odd key': 1}

ANNOTATIONS
  tag::value  a::b::[1, 2]

  Annotations are ordered and travel with the value through pruning.
"#;

const EXPRESSIONS_DOC: &str = r#"EXPRESSIONS - Operands and checks

LITERALS
  Any scalar from the text form, plus `now` for the current time.

SELECTIONS
  /order/total             Value at a path in the document
  /order/total as decimal  Same, checked against a kind
  /order/note?             Optional step: a missing value selects null

  A missing required step is an error.

EXISTENCE AND TYPE CHECKS
  exists /customer/email
  /customer/email is string
  /customer/email is not null
  /amount is number          (int, float or decimal)

  These never fail on a missing value; they return false.

OTHER
  not /flag
  concat(/first, " ", /last)
  /status has annotation "draft"
"#;

const OPERATORS_DOC: &str = r#"OPERATORS - Tightest binding first

  ^              power (right to left)
  * / %          multiply, divide, remainder
  + -            add, subtract (numbers, timestamps and durations)
  > < >= <=      ordering
  == !=          equality
  and
  xor
  nor
  or

NUMBERS
  Ints have no size limit. int with int stays int; int with float is
  float; decimal with int or float is decimal, or float when a value is
  beyond the decimal range. Integer division truncates. Division by zero
  is an error.

NULLS
  Arithmetic with null yields null of the result kind; comparisons and
  logical operators with null yield null.bool.

LISTS AND RANGES
  /status in ("open", "held")
  /status not in ("closed")
  /amount between (10, 20)
  /amount not between (10, 20)

STRINGS
  /name matches "^[A-Z]"
  /name starts with "Dr"
  /name ends with "son"
  /name contains "an"
"#;

const PATHS_DOC: &str = r#"PATHS - Addressing values

  /a/b         field b of field a
  /items/[0]   first item of a list or sexp
  /a/*         every field of a
  /items/[*]   every item
  /'odd key'   quoted field name
  /a/b?        optional step

  A wildcard in a single-valued selection picks the first child.
"#;

const QUERIES_DOC: &str = r#"QUERIES - Paths with predicates

  /family/.{# ends with "ther"}   fields whose name ends in "ther"
  /items/[{@/price > 10}]         items whose price is over 10
  /items/[{# < 2}]                the first two items

  Inside a predicate, # is the candidate's key and @ the candidate itself.
  A predicate that yields null skips the candidate. Steps into values of
  the wrong shape find nothing rather than failing.

  trellis select --all '/items/[{@/price > 10}]'
"#;

const PRUNING_DOC: &str = r#"PRUNING - Keeping only what paths name

  trellis prune '/order/id, /order/lines/[0], /customer/name?'

  Paths are merged into a tree. Pruning copies the document keeping only
  the named parts, in document order. A required part that is missing is
  an error; an optional one is skipped.

  A wildcard keeps every child of its container, and absorbs any named
  siblings of the same family.

PROVENANCE
  Pruned lists and sexps are annotated with the indices they came from:

    {items: [a, b, c]}  pruned by /items/[0], /items/[2]
    {items: '$indices:0,2'::[a, c]}

VALIDATION
  trellis prune --validate '<paths>' checks a document without printing it.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_topic_resolves() {
        for topic in DocTopic::ALL {
            assert!(!topic.content().is_empty());
        }
        assert_eq!(DocTopic::from_name("Prune"), Some(DocTopic::Pruning));
    }

    #[test]
    fn unknown_topics_are_errors() {
        assert!(matches!(
            get_doc_topic("widgets"),
            Err(CliError::UnknownTopic(topic)) if topic == "widgets"
        ));
    }
}
