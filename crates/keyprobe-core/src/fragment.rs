// ABOUTME: Textual configuration fragments for SSH key resources and lookups
// ABOUTME: Renders create/lookup blocks and parses the small block grammar back

use std::fmt;

use crate::error::FragmentError;

/// Resource type shared by the create and lookup blocks.
pub const KEY_RESOURCE_TYPE: &str = "digitalocean_ssh_key";

/// Attribute value: a string literal or a dotted reference
/// (`digitalocean_ssh_key.foo.name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Reference(Vec<String>),
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal(value.into())
    }

    /// Build a reference from dotted text.
    pub fn reference(path: &str) -> Self {
        Expr::Reference(path.split('.').map(str::to_string).collect())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "\"{}\"", escape(value)),
            Expr::Reference(parts) => write!(f, "{}", parts.join(".")),
        }
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' => {
                // A run of dollars before '{' gains one more so it stays literal.
                let mut dollars = 1;
                while chars.peek() == Some(&'$') {
                    chars.next();
                    dollars += 1;
                }
                if chars.peek() == Some(&'{') {
                    dollars += 1;
                }
                out.extend(std::iter::repeat('$').take(dollars));
            }
            other => out.push(other),
        }
    }
    out
}

/// Block that creates an SSH key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFragment {
    pub label: String,
    pub name: String,
    pub public_key: String,
}

impl ResourceFragment {
    pub fn new(
        label: impl Into<String>,
        name: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
            public_key: public_key.into(),
        }
    }

    /// State address, e.g. `digitalocean_ssh_key.foo`.
    pub fn address(&self) -> String {
        format!("{KEY_RESOURCE_TYPE}.{}", self.label)
    }

    /// Reference to this resource's `name` attribute.
    pub fn name_ref(&self) -> Expr {
        Expr::Reference(vec![
            KEY_RESOURCE_TYPE.to_string(),
            self.label.clone(),
            "name".to_string(),
        ])
    }
}

impl fmt::Display for ResourceFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "resource \"{KEY_RESOURCE_TYPE}\" \"{}\" {{", self.label)?;
        writeln!(f, "  name       = {}", Expr::literal(self.name.as_str()))?;
        writeln!(f, "  public_key = {}", Expr::literal(self.public_key.as_str()))?;
        writeln!(f, "}}")
    }
}

/// Block that reads an SSH key back by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFragment {
    pub label: String,
    pub name: Expr,
}

impl LookupFragment {
    pub fn new(label: impl Into<String>, name: Expr) -> Self {
        Self {
            label: label.into(),
            name,
        }
    }

    /// State address, e.g. `data.digitalocean_ssh_key.foobar`.
    pub fn address(&self) -> String {
        format!("data.{KEY_RESOURCE_TYPE}.{}", self.label)
    }
}

impl fmt::Display for LookupFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data \"{KEY_RESOURCE_TYPE}\" \"{}\" {{", self.label)?;
        writeln!(f, "  name = {}", self.name)?;
        writeln!(f, "}}")
    }
}

/// Parsed configuration: a flat list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// `kind "label" "label" { key = value ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub attributes: Vec<(String, Expr)>,
}

impl Block {
    pub fn attribute(&self, key: &str) -> Option<&Expr> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    fn display_name(&self) -> String {
        std::iter::once(self.kind.clone())
            .chain(self.labels.iter().cloned())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    LBrace,
    RBrace,
    Equals,
    Dot,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Str(s) => format!("{s:?}"),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Equals => "'='".to_string(),
            Token::Dot => "'.'".to_string(),
        }
    }
}

struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn tokenize(src: &str) -> Result<Vec<Spanned>, FragmentError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let (mut line, mut column) = (1usize, 0usize);

    while let Some(c) = chars.next() {
        column += 1;
        let (start_line, start_column) = (line, column);
        let token = match c {
            '\n' => {
                line += 1;
                column = 0;
                continue;
            }
            c if c.is_whitespace() => continue,
            '#' => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
                continue;
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
                continue;
            }
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '=' => Token::Equals,
            '.' => Token::Dot,
            '"' => {
                let mut value = String::new();
                loop {
                    let Some(c) = chars.next() else {
                        return Err(FragmentError::UnterminatedString { line: start_line });
                    };
                    column += 1;
                    match c {
                        '"' => break,
                        '\n' => return Err(FragmentError::UnterminatedString { line: start_line }),
                        '\\' => {
                            let Some(escaped) = chars.next() else {
                                return Err(FragmentError::UnterminatedString { line: start_line });
                            };
                            column += 1;
                            value.push(match escaped {
                                '"' => '"',
                                '\\' => '\\',
                                'n' => '\n',
                                'r' => '\r',
                                't' => '\t',
                                other => {
                                    return Err(FragmentError::InvalidEscape { line, found: other })
                                }
                            });
                        }
                        '$' => {
                            let mut dollars = 1;
                            while chars.peek() == Some(&'$') {
                                chars.next();
                                column += 1;
                                dollars += 1;
                            }
                            if chars.peek() == Some(&'{') {
                                if dollars == 1 {
                                    return Err(FragmentError::Interpolation { line });
                                }
                                dollars -= 1;
                            }
                            value.extend(std::iter::repeat('$').take(dollars));
                        }
                        other => value.push(other),
                    }
                }
                Token::Str(value)
            }
            c if is_ident_char(c) => {
                let mut ident = c.to_string();
                while let Some(&n) = chars.peek() {
                    if !is_ident_char(n) {
                        break;
                    }
                    ident.push(n);
                    chars.next();
                    column += 1;
                }
                Token::Ident(ident)
            }
            other => {
                return Err(FragmentError::UnexpectedChar {
                    line,
                    column,
                    found: other,
                })
            }
        };

        tokens.push(Spanned {
            token,
            line: start_line,
            column: start_column,
        });
    }

    Ok(tokens)
}

struct Parser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Spanned>>,
}

impl Parser {
    fn next(&mut self, expected: &'static str) -> Result<Spanned, FragmentError> {
        self.tokens
            .next()
            .ok_or(FragmentError::UnexpectedEof { expected })
    }

    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|s| &s.token)
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), FragmentError> {
        let next = self.next(expected)?;
        if next.token == token {
            Ok(())
        } else {
            Err(unexpected(&next, expected))
        }
    }

    fn block(&mut self, kind: String) -> Result<Block, FragmentError> {
        let mut labels = Vec::new();
        while let Some(Token::Str(_)) = self.peek() {
            if let Some(Spanned {
                token: Token::Str(label),
                ..
            }) = self.tokens.next()
            {
                labels.push(label);
            }
        }
        self.expect(Token::LBrace, "'{'")?;

        let mut block = Block {
            kind,
            labels,
            attributes: Vec::new(),
        };

        loop {
            let next = self.next("attribute or '}'")?;
            match next.token {
                Token::RBrace => break,
                Token::Ident(name) => {
                    self.expect(Token::Equals, "'='")?;
                    let value = self.expr()?;
                    if block.attribute(&name).is_some() {
                        return Err(FragmentError::DuplicateAttribute {
                            block: block.display_name(),
                            attribute: name,
                        });
                    }
                    block.attributes.push((name, value));
                }
                _ => return Err(unexpected(&next, "attribute or '}'")),
            }
        }

        Ok(block)
    }

    fn expr(&mut self) -> Result<Expr, FragmentError> {
        let next = self.next("value")?;
        match next.token {
            Token::Str(value) => Ok(Expr::Literal(value)),
            Token::Ident(root) => {
                let mut parts = vec![root];
                while self.peek() == Some(&Token::Dot) {
                    self.tokens.next();
                    let part = self.next("identifier")?;
                    match part.token {
                        Token::Ident(name) => parts.push(name),
                        _ => return Err(unexpected(&part, "identifier")),
                    }
                }
                Ok(Expr::Reference(parts))
            }
            _ => Err(unexpected(&next, "value")),
        }
    }
}

fn unexpected(spanned: &Spanned, expected: &'static str) -> FragmentError {
    FragmentError::UnexpectedToken {
        line: spanned.line,
        column: spanned.column,
        expected,
        found: spanned.token.describe(),
    }
}

/// Parse configuration text into blocks.
pub fn parse(src: &str) -> Result<Document, FragmentError> {
    let mut parser = Parser {
        tokens: tokenize(src)?.into_iter().peekable(),
    };

    let mut document = Document::default();
    while let Some(next) = parser.tokens.next() {
        match next.token {
            Token::Ident(kind) => document.blocks.push(parser.block(kind)?),
            _ => return Err(unexpected(&next, "block type")),
        }
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIO3mepiIGcR/X0pUqTHo4qI27NLDq/DXpX/C2m+nGcM9";

    #[test]
    fn test_resource_fragment_renders_expected_text() {
        let fragment = ResourceFragment::new("foo", "acc-key", PUBLIC_KEY);
        let expected = format!(
            "resource \"digitalocean_ssh_key\" \"foo\" {{\n  name       = \"acc-key\"\n  public_key = \"{PUBLIC_KEY}\"\n}}\n"
        );
        assert_eq!(fragment.to_string(), expected);
        assert_eq!(fragment.address(), "digitalocean_ssh_key.foo");
    }

    #[test]
    fn test_lookup_fragment_renders_reference() {
        let resource = ResourceFragment::new("foo", "acc-key", PUBLIC_KEY);
        let lookup = LookupFragment::new("foobar", resource.name_ref());
        assert_eq!(
            lookup.to_string(),
            "data \"digitalocean_ssh_key\" \"foobar\" {\n  name = digitalocean_ssh_key.foo.name\n}\n"
        );
        assert_eq!(lookup.address(), "data.digitalocean_ssh_key.foobar");
    }

    #[test]
    fn test_parse_rendered_fragments() {
        let resource = ResourceFragment::new("foo", "acc-key", PUBLIC_KEY);
        let lookup = LookupFragment::new("foobar", resource.name_ref());
        let doc = parse(&format!("{resource}\n{lookup}")).unwrap();

        assert_eq!(doc.blocks.len(), 2);
        let block = &doc.blocks[0];
        assert_eq!(block.kind, "resource");
        assert_eq!(block.labels, vec!["digitalocean_ssh_key", "foo"]);
        assert_eq!(block.attribute("name"), Some(&Expr::literal("acc-key")));
        assert_eq!(block.attribute("public_key"), Some(&Expr::literal(PUBLIC_KEY)));

        let data = &doc.blocks[1];
        assert_eq!(data.kind, "data");
        assert_eq!(
            data.attribute("name"),
            Some(&Expr::reference("digitalocean_ssh_key.foo.name"))
        );
    }

    #[test]
    fn test_literal_escaping_survives_parse() {
        let tricky = "quote \" backslash \\ newline \n template ${var} $${x} cost $$5";
        let fragment = ResourceFragment::new("foo", tricky, PUBLIC_KEY);
        let doc = parse(&fragment.to_string()).unwrap();
        assert_eq!(doc.blocks[0].attribute("name"), Some(&Expr::literal(tricky)));
    }

    #[test]
    fn test_parse_skips_comments_and_single_line_blocks() {
        let src = r#"
# a comment
// another one
data "digitalocean_ssh_key" "x" { name = "k" }
"#;
        let doc = parse(src).unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].attribute("name"), Some(&Expr::literal("k")));
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(parse("  \n# nothing\n").unwrap(), Document::default());
    }

    #[test]
    fn test_parse_rejects_interpolation() {
        let err = parse("data \"t\" \"x\" {\n  name = \"${var.name}\"\n}").unwrap_err();
        assert_eq!(err, FragmentError::Interpolation { line: 2 });
    }

    #[test]
    fn test_parse_rejects_unterminated_string() {
        let err = parse("data \"t\" \"x\" {\n  name = \"oops\n}").unwrap_err();
        assert_eq!(err, FragmentError::UnterminatedString { line: 2 });
    }

    #[test]
    fn test_parse_rejects_missing_equals() {
        let err = parse("data \"t\" \"x\" {\n  name \"k\"\n}").unwrap_err();
        assert_eq!(
            err,
            FragmentError::UnexpectedToken {
                line: 2,
                column: 8,
                expected: "'='",
                found: "\"k\"".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_unclosed_block() {
        let err = parse("data \"t\" \"x\" {\n  name = \"k\"\n").unwrap_err();
        assert_eq!(
            err,
            FragmentError::UnexpectedEof {
                expected: "attribute or '}'"
            }
        );
    }

    #[test]
    fn test_parse_rejects_duplicate_attribute() {
        let err = parse("resource \"t\" \"x\" {\n name = \"a\"\n name = \"b\"\n}").unwrap_err();
        assert_eq!(
            err,
            FragmentError::DuplicateAttribute {
                block: "resource.t.x".to_string(),
                attribute: "name".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_escape_and_char() {
        assert!(matches!(
            parse("a { b = \"\\q\" }").unwrap_err(),
            FragmentError::InvalidEscape { found: 'q', .. }
        ));
        assert!(matches!(
            parse("a { b = [1] }").unwrap_err(),
            FragmentError::UnexpectedChar { found: '[', .. }
        ));
    }
}
