use crate::error::ParseError;
use crate::node::*;

/// A hand-written, scannerless recursive-descent parser over the Wandle
/// grammar (§6, grounded directly on `arpeggio_parse.py`'s rule
/// definitions). There is no separate tokenizing phase — each rule
/// reads characters directly at its own parse position, the way the
/// arpeggio PEG grammar it's ported from does.
///
/// Keyword/type/dotref lookahead never needs real backtracking: every
/// branch point in this grammar is resolved by a single non-consuming
/// peek (a keyword, an opening brace, or the case of the next
/// identifier's first letter — type names start uppercase, dotref
/// identifiers start lowercase by the DSL's own naming convention, §6).
pub struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        return Self { src, pos: 0 };
    }

    pub fn parse(src: &'a str) -> Result<Node, ParseError> {
        let mut parser = Parser::new(src);
        return parser.parse_grammar();
    }

    fn line_col(&self, pos: usize) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;
        for c in self.src[..pos.min(self.src.len())].chars() {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        return (line, col);
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let (line, col) = self.line_col(self.pos);
        return ParseError::new(message, line, col);
    }

    fn rest(&self) -> &'a str {
        return &self.src[self.pos..];
    }

    fn eof(&self) -> bool {
        return self.ws_skipped_pos() >= self.src.len();
    }

    fn ws_skipped_pos(&self) -> usize {
        let mut p = self.pos;
        let bytes = self.src.as_bytes();
        while p < bytes.len() && (bytes[p] as char).is_whitespace() {
            p += 1;
        }
        return p;
    }

    fn skip_ws(&mut self) {
        self.pos = self.ws_skipped_pos();
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let p = self.ws_skipped_pos();
        let rest = &self.src[p..];
        if !rest.starts_with(keyword) {
            return false;
        }
        return match rest[keyword.len()..].chars().next() {
            Some(c) => !(c.is_ascii_alphanumeric() || c == '_'),
            None => true,
        };
    }

    fn peek_punct(&self, punct: &str) -> bool {
        let p = self.ws_skipped_pos();
        return self.src[p..].starts_with(punct);
    }

    fn peek_uppercase(&self) -> bool {
        let p = self.ws_skipped_pos();
        return self.src[p..].chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false);
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.peek_keyword(keyword) {
            self.pos = self.ws_skipped_pos() + keyword.len();
            return Ok(());
        }
        return Err(self.error(format!("expected '{}'", keyword)));
    }

    fn try_punct(&mut self, punct: &str) -> bool {
        if self.peek_punct(punct) {
            self.pos = self.ws_skipped_pos() + punct.len();
            return true;
        }
        return false;
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ParseError> {
        if self.try_punct(punct) {
            return Ok(());
        }
        return Err(self.error(format!("expected '{}'", punct)));
    }

    /// `\w+` — one or more word characters. Used for dotref tokens, flow
    /// names, single/var/parameter names, and inheritance-list entries
    /// (the original's `_word` and `_snake` regexes share this same
    /// character class and differ only in allowing a zero-length match;
    /// a zero-length identifier is never meaningful, so this parser
    /// requires at least one character in both cases).
    fn match_identifier(&mut self) -> Option<String> {
        self.skip_ws();
        let mut end = 0;
        for (i, c) in self.rest().char_indices() {
            if c.is_ascii_alphanumeric() || c == '_' {
                end = i + c.len_utf8();
            } else {
                break;
            }
        }
        if end == 0 {
            return None;
        }
        let value = self.rest()[..end].to_string();
        self.pos += end;
        return Some(value);
    }

    /// `[A-Z][A-Z]*` — a generic template-parameter name.
    fn match_caps(&mut self) -> Option<String> {
        self.skip_ws();
        let mut chars = self.rest().char_indices();
        let (_, first) = chars.next()?;
        if !first.is_ascii_uppercase() {
            return None;
        }
        let mut end = first.len_utf8();
        for (i, c) in chars {
            if c.is_ascii_uppercase() {
                end = i + c.len_utf8();
            } else {
                break;
            }
        }
        let value = self.rest()[..end].to_string();
        self.pos += end;
        return Some(value);
    }

    /// `[A-Z][a-zA-Z0-9/,]*` — a type string, possibly a generic
    /// instantiation (`G/A1,A2`).
    fn match_type(&mut self) -> Option<String> {
        self.skip_ws();
        let mut chars = self.rest().char_indices();
        let (_, first) = chars.next()?;
        if !first.is_ascii_uppercase() {
            return None;
        }
        let mut end = first.len_utf8();
        for (i, c) in chars {
            if c.is_ascii_alphanumeric() || c == '/' || c == ',' {
                end = i + c.len_utf8();
            } else {
                break;
            }
        }
        let value = self.rest()[..end].to_string();
        self.pos += end;
        return Some(value);
    }

    fn parse_grammar(&mut self) -> Result<Node, ParseError> {
        let mut children = Vec::new();
        loop {
            self.skip_ws();
            if self.eof() {
                break;
            }
            match self.try_top_decl()? {
                Some(node) => children.push(node),
                None => break,
            }
        }
        self.skip_ws();
        if !self.eof() {
            return Err(self.error("unexpected trailing input"));
        }
        return Ok(Node::non_terminal(RULE_GRAMMAR, children));
    }

    fn try_top_decl(&mut self) -> Result<Option<Node>, ParseError> {
        if self.peek_keyword("class") {
            return Ok(Some(self.parse_class()?));
        }
        if self.peek_keyword("single") {
            return Ok(Some(self.parse_single()?));
        }
        if self.peek_keyword("generic") {
            return Ok(Some(self.parse_generic()?));
        }
        if self.peek_keyword("alias") {
            return Ok(Some(self.parse_alias()?));
        }
        if self.peek_keyword("flow") {
            return Ok(Some(self.parse_flow()?));
        }
        return Ok(None);
    }

    fn parse_word_list(&mut self, rule_name: &'static str) -> Result<Node, ParseError> {
        let mut words = vec![self.match_identifier().ok_or_else(|| self.error("expected a name"))?];
        while self.try_punct(",") {
            words.push(self.match_identifier().ok_or_else(|| self.error("expected a name"))?);
        }
        return Ok(Node::non_terminal(rule_name, words.into_iter().map(Node::terminal).collect()));
    }

    fn parse_caps_list(&mut self) -> Result<Node, ParseError> {
        let mut caps = vec![self.match_caps().ok_or_else(|| self.error("expected a template parameter"))?];
        while self.try_punct(",") {
            caps.push(self.match_caps().ok_or_else(|| self.error("expected a template parameter"))?);
        }
        return Ok(Node::non_terminal(RULE_CSEP_CAPS, caps.into_iter().map(Node::terminal).collect()));
    }

    fn parse_class(&mut self) -> Result<Node, ParseError> {
        self.expect_keyword("class")?;
        let name = self.match_identifier().ok_or_else(|| self.error("expected a class name"))?;
        if self.peek_keyword("is") {
            self.expect_keyword("is")?;
            let parents = self.parse_word_list(RULE_CLASS_INH_LIST)?;
            if self.try_punct(".") {
                return Ok(Node::non_terminal(
                    RULE_CLASS_GRAM,
                    vec![Node::non_terminal(RULE_CLASS_INH_STUB, vec![Node::terminal(name), parents])],
                ));
            }
            let block = self.parse_cgs_block()?;
            return Ok(Node::non_terminal(
                RULE_CLASS_GRAM,
                vec![Node::non_terminal(RULE_CLASS_INH_IMPL, vec![Node::terminal(name), parents, block])],
            ));
        }
        if self.try_punct(".") {
            return Ok(Node::non_terminal(
                RULE_CLASS_GRAM,
                vec![Node::non_terminal(RULE_CLASS_BASE_STUB, vec![Node::terminal(name)])],
            ));
        }
        let block = self.parse_cgs_block()?;
        return Ok(Node::non_terminal(
            RULE_CLASS_GRAM,
            vec![Node::non_terminal(RULE_CLASS_BASE_IMPL, vec![Node::terminal(name), block])],
        ));
    }

    fn parse_single(&mut self) -> Result<Node, ParseError> {
        self.expect_keyword("single")?;
        let name = self.match_identifier().ok_or_else(|| self.error("expected a single name"))?;
        if self.try_punct(".") {
            return Ok(Node::non_terminal(
                RULE_SINGLE_GRAM,
                vec![Node::non_terminal(RULE_SINGLE_STUB, vec![Node::terminal(name)])],
            ));
        }
        let block = self.parse_cgs_block()?;
        return Ok(Node::non_terminal(
            RULE_SINGLE_GRAM,
            vec![Node::non_terminal(RULE_SINGLE_IMPL, vec![Node::terminal(name), block])],
        ));
    }

    fn parse_generic(&mut self) -> Result<Node, ParseError> {
        self.expect_keyword("generic")?;
        let name = self.match_type().ok_or_else(|| self.error("expected a generic name"))?;
        let params = self.parse_caps_list()?;
        if self.try_punct(".") {
            return Ok(Node::non_terminal(
                RULE_GENERIC_GRAM,
                vec![Node::non_terminal(RULE_GENERIC_STUB, vec![Node::terminal(name), params])],
            ));
        }
        let block = self.parse_cgs_block()?;
        return Ok(Node::non_terminal(
            RULE_GENERIC_GRAM,
            vec![Node::non_terminal(RULE_GENERIC_IMPL, vec![Node::terminal(name), params, block])],
        ));
    }

    fn parse_alias(&mut self) -> Result<Node, ParseError> {
        self.expect_keyword("alias")?;
        let alias_name = self.match_type().ok_or_else(|| self.error("expected a type name"))?;
        self.expect_keyword("to")?;
        let target = self.match_type().ok_or_else(|| self.error("expected a type name"))?;
        self.expect_punct(".")?;
        return Ok(Node::non_terminal(RULE_ALIAS_GRAM, vec![Node::terminal(alias_name), Node::terminal(target)]));
    }

    fn parse_flow(&mut self) -> Result<Node, ParseError> {
        self.expect_keyword("flow")?;
        let name = self.match_identifier().ok_or_else(|| self.error("expected a flow name"))?;
        if self.try_punct(".") {
            return Ok(Node::non_terminal(RULE_FLOW_GRAM, vec![Node::non_terminal(RULE_FLOW_STUB, vec![Node::terminal(name)])]));
        }
        let body = self.parse_cb_grammar()?;
        return Ok(Node::non_terminal(
            RULE_FLOW_GRAM,
            vec![Node::non_terminal(RULE_FLOW_IMPL, vec![Node::terminal(name), body])],
        ));
    }

    fn parse_cgs_block(&mut self) -> Result<Node, ParseError> {
        self.expect_punct("{")?;
        let mut children = Vec::new();
        loop {
            self.skip_ws();
            if self.try_punct("}") {
                break;
            }
            children.push(self.parse_cgs_member()?);
        }
        return Ok(Node::non_terminal(RULE_CGS_BLOCK, children));
    }

    fn parse_cgs_member(&mut self) -> Result<Node, ParseError> {
        if self.peek_keyword("async") {
            return self.parse_cgs_function("async", RULE_CGS_ASYNC_STUB, RULE_CGS_ASYNC_IMPL);
        }
        if self.peek_keyword("sync") {
            return self.parse_cgs_function("sync", RULE_CGS_SYNC_STUB, RULE_CGS_SYNC_IMPL);
        }
        let type_name = self.match_type().ok_or_else(|| self.error("expected a member type"))?;
        let name = self.match_identifier().ok_or_else(|| self.error("expected a member name"))?;
        if self.try_punct(";") {
            return Ok(Node::non_terminal(RULE_CGS_VAR_STUB, vec![Node::terminal(type_name), Node::terminal(name)]));
        }
        if self.try_punct("!") {
            return Ok(Node::non_terminal(RULE_CGS_VAR_READY, vec![Node::terminal(type_name), Node::terminal(name)]));
        }
        return Err(self.error("expected ';' or '!' after member declaration"));
    }

    fn parse_cgs_function(&mut self, keyword: &str, stub_rule: &'static str, impl_rule: &'static str) -> Result<Node, ParseError> {
        self.expect_keyword(keyword)?;
        let return_type = self.match_type().ok_or_else(|| self.error("expected a return type"))?;
        let name = self.match_identifier().ok_or_else(|| self.error("expected a function name"))?;
        let sig = self.parse_method_sig()?;
        if self.try_punct(";") {
            return Ok(Node::non_terminal(stub_rule, vec![Node::terminal(return_type), Node::terminal(name), sig]));
        }
        let body = self.parse_cb_grammar()?;
        return Ok(Node::non_terminal(impl_rule, vec![Node::terminal(return_type), Node::terminal(name), sig, body]));
    }

    fn parse_method_sig(&mut self) -> Result<Node, ParseError> {
        self.expect_punct("(")?;
        let mut pairs = Vec::new();
        self.skip_ws();
        if !self.try_punct(")") {
            loop {
                let type_name = self.match_type().ok_or_else(|| self.error("expected a parameter type"))?;
                let name = self.match_identifier().ok_or_else(|| self.error("expected a parameter name"))?;
                pairs.push(Node::non_terminal(RULE_SIG_PAIR, vec![Node::terminal(type_name), Node::terminal(name)]));
                if self.try_punct(",") {
                    continue;
                }
                self.expect_punct(")")?;
                break;
            }
        }
        return Ok(Node::non_terminal(RULE_METHOD_SIG, pairs));
    }

    fn parse_cb_grammar(&mut self) -> Result<Node, ParseError> {
        self.expect_punct("{")?;
        let mut children = Vec::new();
        loop {
            self.skip_ws();
            if self.try_punct("}") {
                break;
            }
            if self.peek_keyword("return") {
                children.push(self.parse_cb_return()?);
                self.skip_ws();
                self.expect_punct("}")?;
                break;
            }
            children.push(self.parse_cb_statement()?);
        }
        return Ok(Node::non_terminal(RULE_CB_GRAMMAR, children));
    }

    fn parse_cb_statement(&mut self) -> Result<Node, ParseError> {
        if self.peek_keyword("note") {
            return self.parse_cb_note();
        }
        if self.peek_uppercase() {
            let type_name = self.match_type().ok_or_else(|| self.error("expected a type name"))?;
            let name = self.match_identifier().ok_or_else(|| self.error("expected a variable name"))?;
            if self.try_punct(";") {
                return Ok(Node::non_terminal(RULE_CB_VAR_STUB, vec![Node::terminal(type_name), Node::terminal(name)]));
            }
            if self.try_punct("!") {
                return Ok(Node::non_terminal(RULE_CB_VAR_READY, vec![Node::terminal(type_name), Node::terminal(name)]));
            }
            if self.peek_punct("<<") {
                let (rhs, args) = self.parse_call_tail("<<")?;
                return Ok(Node::non_terminal(RULE_CB_VAR_ASYNC_SET, vec![Node::terminal(type_name), Node::terminal(name), rhs, args]));
            }
            if self.peek_punct("=") {
                let (rhs, args) = self.parse_call_tail("=")?;
                return Ok(Node::non_terminal(RULE_CB_VAR_SYNC_SET, vec![Node::terminal(type_name), Node::terminal(name), rhs, args]));
            }
            return Err(self.error("expected ';', '!', '=' or '<<' after variable declaration"));
        }

        let lhs = self.parse_dotref()?;
        if self.peek_punct("=") {
            self.expect_punct("=")?;
            let rhs = self.parse_dotref()?;
            if self.try_punct(";") {
                return Ok(Node::non_terminal(RULE_CB_SYNC_COPY, vec![lhs, rhs]));
            }
            let args = self.parse_arglist()?;
            self.expect_punct(";")?;
            return Ok(Node::non_terminal(RULE_CB_SYNC_FROM, vec![lhs, rhs, args]));
        }
        if self.peek_punct("<<") {
            self.expect_punct("<<")?;
            let rhs = self.parse_dotref()?;
            let args = self.parse_arglist()?;
            self.expect_punct(";")?;
            return Ok(Node::non_terminal(RULE_CB_ASYNC_FROM, vec![lhs, rhs, args]));
        }
        return Err(self.error("expected '=' or '<<' after a dotted reference"));
    }

    fn parse_call_tail(&mut self, op: &str) -> Result<(Node, Node), ParseError> {
        self.expect_punct(op)?;
        let rhs = self.parse_dotref()?;
        let args = self.parse_arglist()?;
        self.expect_punct(";")?;
        return Ok((rhs, args));
    }

    fn parse_arglist(&mut self) -> Result<Node, ParseError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        self.skip_ws();
        if !self.try_punct(")") {
            loop {
                args.push(self.parse_dotref()?);
                if self.try_punct(",") {
                    continue;
                }
                self.expect_punct(")")?;
                break;
            }
        }
        return Ok(Node::non_terminal(RULE_ARGLIST, args));
    }

    fn parse_dotref(&mut self) -> Result<Node, ParseError> {
        let first = self.match_identifier().ok_or_else(|| self.error("expected an identifier"))?;
        let mut parts = vec![Node::terminal(first)];
        while self.try_punct(".") {
            parts.push(Node::terminal(self.match_identifier().ok_or_else(|| self.error("expected an identifier"))?));
        }
        return Ok(Node::non_terminal(RULE_DOTREF, parts));
    }

    fn parse_cb_note(&mut self) -> Result<Node, ParseError> {
        self.expect_keyword("note")?;
        self.expect_punct("{")?;
        let start = self.pos;
        let end_rel = self.rest().find('}').ok_or_else(|| self.error("unterminated note"))?;
        let raw = self.src[start..start + end_rel].to_string();
        self.pos = start + end_rel;
        self.expect_punct("}")?;
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        return Ok(Node::non_terminal(RULE_CB_NOTE, vec![Node::terminal(text)]));
    }

    fn parse_cb_return(&mut self) -> Result<Node, ParseError> {
        self.expect_keyword("return")?;
        let dotref = self.parse_dotref()?;
        self.expect_punct(";")?;
        return Ok(Node::non_terminal(RULE_CB_RETURN, vec![dotref]));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_source_parses_to_empty_grammar() {
        let node = Parser::parse("").unwrap();
        assert_eq!(node.rule_name(), RULE_GRAMMAR);
        assert!(node.children().is_empty());
    }

    #[test]
    fn parses_class_stub() {
        let node = Parser::parse("class Effect.").unwrap();
        let class_gram = &node.children()[0];
        let stub = &class_gram.children()[0];
        assert_eq!(stub.rule_name(), RULE_CLASS_BASE_STUB);
        assert_eq!(stub.children()[0].value(), Some("Effect"));
    }

    #[test]
    fn parses_alias_and_generic() {
        let src = "class Effect.\ngeneric List T.\nalias Effects to List/Effect.";
        let node = Parser::parse(src).unwrap();
        assert_eq!(node.children().len(), 3);
        let alias = &node.children()[2];
        assert_eq!(alias.rule_name(), RULE_ALIAS_GRAM);
        assert_eq!(alias.children()[0].value(), Some("Effects"));
        assert_eq!(alias.children()[1].value(), Some("List/Effect"));
    }

    #[test]
    fn parses_inheritance_and_body() {
        let src = "class Base { sync Void ping() {note{p}} }\nclass Derived is Base.";
        let node = Parser::parse(src).unwrap();
        let base = &node.children()[0].children()[0];
        assert_eq!(base.rule_name(), RULE_CLASS_BASE_IMPL);
        let block = &base.children()[1];
        assert_eq!(block.rule_name(), RULE_CGS_BLOCK);
        let ping = &block.children()[0];
        assert_eq!(ping.rule_name(), RULE_CGS_SYNC_IMPL);
        assert_eq!(ping.children()[1].value(), Some("ping"));

        let derived = &node.children()[1].children()[0];
        assert_eq!(derived.rule_name(), RULE_CLASS_INH_STUB);
        assert_eq!(derived.children()[1].terminal_values(), vec!["Base".to_string()]);
    }

    #[test]
    fn parses_flow_with_statements() {
        let src = "flow main { Foo x; Void y = bar(x); }";
        let node = Parser::parse(src).unwrap();
        let flow_impl = &node.children()[0].children()[0];
        assert_eq!(flow_impl.rule_name(), RULE_FLOW_IMPL);
        let body = &flow_impl.children()[1];
        assert_eq!(body.children()[0].rule_name(), RULE_CB_VAR_STUB);
        assert_eq!(body.children()[1].rule_name(), RULE_CB_VAR_SYNC_SET);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(Parser::parse("class Foo. bogus###").is_err());
    }
}
