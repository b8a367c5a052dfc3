pub mod error;
pub mod grammar;
pub mod node;
pub mod strip;

pub use error::ParseError;
pub use grammar::Parser;
pub use node::Node;
pub use strip::strip_comments;

/// Strips comments and parses a full Wandle source file (§4.1 + §4.2 +
/// §6), producing the root `_grammar` node the declaration walker
/// consumes.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    let stripped = strip_comments(source);
    return Parser::parse(&stripped);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_with_comments_stripped() {
        let src = "# a header comment\nclass Effect. # marks an effect\n";
        let node = parse(src).unwrap();
        assert_eq!(node.rule_name(), node::RULE_GRAMMAR);
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn end_to_end_scenario_two_parses() {
        let src = "class Effect.\ngeneric List T.\nalias Effects to List/Effect.";
        let node = parse(src).unwrap();
        assert_eq!(node.children().len(), 3);
    }
}
