//! Construction notation recursive descent parser.
//!
//! Parses token streams into a [`Graph`]:
//! - `id [pred<cfrom:cto>("carg") cvarsort key=value ...];` node lines
//! - `from:ROLE/POST -> to;` link lines
//! - `0:/H -> id;` the top pseudo-link

use crate::model::{Graph, Link, Node, NodeId, Post, Predicate};
use crate::{Error, Result};
use super::lexer::{Token, TokenKind};

/// Parser state: a token slice with a cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token> {
        let tok = self.peek();
        if tok.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {:?}, got {:?} '{}'", kind, tok.kind, tok.text)))
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, msg: String) -> Error {
        Error::SyntaxError {
            position: self.peek().span.start,
            message: msg,
        }
    }

    fn integer(&mut self) -> Result<u32> {
        let tok = self.expect(TokenKind::Integer)?;
        let (text, position) = (tok.text.clone(), tok.span.start);
        text.parse().map_err(|_| Error::SyntaxError {
            position,
            message: format!("Integer out of range: {text}"),
        })
    }
}

/// A link line before endpoint validation.
struct PendingLink {
    from: u32,
    to: u32,
    role: String,
    post: Post,
    position: usize,
}

/// Parse a complete construction from tokens.
pub fn parse_graph(tokens: &[Token]) -> Result<Graph> {
    let mut p = Parser::new(tokens);
    let mut graph = Graph::new();
    let mut links = Vec::new();

    p.expect(TokenKind::Dmrs)?;
    if p.at(TokenKind::Identifier) {
        p.advance(); // optional graph name
    }
    p.expect(TokenKind::LBrace)?;

    while !p.at(TokenKind::RBrace) {
        match (p.peek_kind(), p.peek_kind_at(1)) {
            (TokenKind::Integer, TokenKind::LBracket) => {
                let position = p.peek().span.start;
                let node = parse_node(&mut p)?;
                graph.add_node(node).map_err(|e| Error::SyntaxError {
                    position,
                    message: e.to_string(),
                })?;
            }
            (TokenKind::Integer, TokenKind::Colon) => links.push(parse_link(&mut p)?),
            (kind, _) => return Err(p.error(format!("Unexpected token {kind:?} in graph body"))),
        }
    }
    p.expect(TokenKind::RBrace)?;
    if !p.at(TokenKind::Eof) {
        return Err(p.error(format!("Unexpected token after graph: {:?}", p.peek_kind())));
    }

    // Links may precede the nodes they mention, so endpoints are checked last.
    for link in links {
        let result = if link.from == 0 && link.role.is_empty() {
            graph.set_top(NodeId(link.to))
        } else {
            graph.add_link(Link::new(NodeId(link.from), NodeId(link.to), link.role, link.post))
        };
        result.map_err(|e| Error::SyntaxError { position: link.position, message: e.to_string() })?;
    }

    Ok(graph)
}

// ============================================================================
// Line parsers
// ============================================================================

fn parse_node(p: &mut Parser) -> Result<Node> {
    let id = p.integer()?;
    p.expect(TokenKind::LBracket)?;
    let pred = p.expect(TokenKind::Identifier)?.text.clone();
    let mut node = Node::new(NodeId(id), Predicate::parse(&pred));

    if p.eat(TokenKind::Lt) {
        let cfrom = p.integer()? as usize;
        p.expect(TokenKind::Colon)?;
        let cto = p.integer()? as usize;
        p.expect(TokenKind::Gt)?;
        if cto < cfrom {
            return Err(p.error(format!("Span <{cfrom}:{cto}> ends before it starts")));
        }
        node = node.with_span(cfrom, cto);
    }

    if p.eat(TokenKind::LParen) {
        let carg = p.expect(TokenKind::StringLiteral)?.text.clone();
        p.expect(TokenKind::RParen)?;
        node = node.with_carg(carg);
    }

    while p.at(TokenKind::Identifier) {
        let key = p.advance().text.clone();
        if p.eat(TokenKind::Eq) {
            let value = match p.peek_kind() {
                TokenKind::Identifier | TokenKind::Integer => p.advance().text.clone(),
                kind => return Err(p.error(format!("Expected sort value, got {kind:?}"))),
            };
            node = node.with_sort(key, value);
        } else {
            node = node.with_sort("cvarsort", key);
        }
    }

    p.expect(TokenKind::RBracket)?;
    p.expect(TokenKind::Semicolon)?;
    Ok(node)
}

fn parse_link(p: &mut Parser) -> Result<PendingLink> {
    let position = p.peek().span.start;
    let from = p.integer()?;
    p.expect(TokenKind::Colon)?;
    let role = if p.at(TokenKind::Identifier) {
        p.advance().text.clone()
    } else {
        String::new()
    };
    p.expect(TokenKind::Slash)?;
    let post_tok = p.expect(TokenKind::Identifier)?;
    let post_pos = post_tok.span.start;
    let post: Post = post_tok.text.parse().map_err(|e: Error| Error::SyntaxError {
        position: post_pos,
        message: e.to_string(),
    })?;
    p.expect(TokenKind::Arrow)?;
    let to = p.integer()?;
    p.expect(TokenKind::Semicolon)?;
    Ok(PendingLink { from, to, role, post, position })
}

#[cfg(test)]
mod tests {
    use crate::notation::parse;
    use crate::model::{NodeId, Post};
    use crate::Error;

    const GUARD_DOG: &str = r#"
        dmrs guard_dog {
          10 [_guard_n_1<0:5> x num=sg];
          20 [_dog_n_1<6:9> x pers=3];
          30 [compound<0:9> e];
          0:/H -> 20;
          30:ARG1/EQ -> 20;
          30:ARG2/NEQ -> 10;
        }
    "#;

    #[test]
    fn test_parse_nodes() {
        let g = parse(GUARD_DOG).unwrap();
        assert_eq!(g.node_count(), 3);
        let guard = g.node(NodeId(10)).unwrap();
        assert_eq!(guard.predicate.lemma(), Some("guard"));
        assert_eq!((guard.span.cfrom, guard.span.cto), (0, 5));
        assert_eq!(guard.cvarsort(), Some("x"));
        assert_eq!(guard.sortinfo.get("num").map(String::as_str), Some("sg"));
        assert_eq!(g.node(NodeId(20)).unwrap().sortinfo.get("pers").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_parse_links_and_top() {
        let g = parse(GUARD_DOG).unwrap();
        assert_eq!(g.top(), Some(NodeId(20)));
        assert_eq!(g.link_count(), 2);
        let arg1 = g.out_links(NodeId(30)).find(|l| l.role == "ARG1").unwrap();
        assert_eq!(arg1.to, NodeId(20));
        assert_eq!(arg1.post, Post::Eq);
    }

    #[test]
    fn test_parse_carg() {
        let g = parse(r#"dmrs { 1 [named<0:3>("Kim") x]; }"#).unwrap();
        let kim = g.node(NodeId(1)).unwrap();
        assert!(kim.is_named());
        assert_eq!(kim.predicate.carg(), Some("Kim"));
    }

    #[test]
    fn test_link_before_node() {
        let g = parse("dmrs { 2:ARG1/NEQ -> 1; 1 [_rain_v_1]; 2 [_heavy_a_1]; }").unwrap();
        assert_eq!(g.link_count(), 1);
    }

    #[test]
    fn test_dangling_link_is_syntax_error() {
        let result = parse("dmrs { 1 [_rain_v_1]; 1:ARG1/NEQ -> 9; }");
        assert!(matches!(result, Err(Error::SyntaxError { .. })));
    }

    #[test]
    fn test_bad_post() {
        assert!(parse("dmrs { 1 [a]; 2 [b]; 1:ARG1/XX -> 2; }").is_err());
    }

    #[test]
    fn test_duplicate_node() {
        assert!(parse("dmrs { 1 [a]; 1 [b]; }").is_err());
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(parse("dmrs { } }").is_err());
    }
}
