/// The comment stripper (§4.1): drops `#`-to-end-of-line from source
/// text before parsing. Deterministic; no parsing.
pub fn strip_comments(source: &str) -> String {
    return source
        .split('\n')
        .map(|line| line.split('#').next().unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n");
}

#[cfg(test)]
mod test {
    use super::strip_comments;

    #[test]
    fn drops_trailing_comment() {
        assert_eq!(strip_comments("class Foo. # a comment"), "class Foo.");
    }

    #[test]
    fn drops_whole_line_comment() {
        assert_eq!(strip_comments("# just a comment\nclass Foo."), "\nclass Foo.");
    }

    #[test]
    fn leaves_code_without_hash_untouched() {
        assert_eq!(strip_comments("class Foo.\nclass Bar."), "class Foo.\nclass Bar.");
    }
}
