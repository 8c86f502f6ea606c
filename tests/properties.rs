use quickcheck::{Arbitrary, Gen, QuickCheck, Testable};

use regex_backtrack::{backtrack, Input, Regex};

fn qc<T: Testable>(t: T) {
    QuickCheck::new().tests(2_000).max_tests(4_000).quickcheck(t);
}

/// A small pattern over the alphabet `{a, b, c}`, written in the syntax
/// shared by this crate and the `regex` crate.
///
/// Repetitions never apply to sub-expressions that can match the empty
/// string. The two engines are only guaranteed to report the same match
/// when that holds, since they handle empty loop iterations differently.
#[derive(Clone, Debug)]
struct Pattern(Node);

#[derive(Clone, Debug)]
enum Node {
    Literal(char),
    Class(&'static str),
    Dot,
    Concat(Vec<Node>),
    Alternate(Vec<Node>),
    Group { capture: bool, sub: Box<Node> },
    Repeat { op: &'static str, lazy: bool, sub: Box<Node> },
}

impl Node {
    fn arbitrary(g: &mut Gen, depth: u32) -> Node {
        let kinds = if depth == 0 { 3 } else { 7 };
        match u32::arbitrary(g) % kinds {
            0 => Node::Literal(*g.choose(&['a', 'b', 'c']).unwrap()),
            1 => {
                let classes = ["[ab]", "[^a]", "[b-c]"];
                Node::Class(*g.choose(&classes).unwrap())
            }
            2 => Node::Dot,
            3 => {
                let len = 1 + usize::arbitrary(g) % 3;
                Node::Concat(
                    (0..len).map(|_| Node::arbitrary(g, depth - 1)).collect(),
                )
            }
            4 => {
                let len = 2 + usize::arbitrary(g) % 2;
                Node::Alternate(
                    (0..len).map(|_| Node::arbitrary(g, depth - 1)).collect(),
                )
            }
            5 => Node::Group {
                capture: bool::arbitrary(g),
                sub: Box::new(Node::arbitrary(g, depth - 1)),
            },
            _ => {
                let mut sub = Node::arbitrary(g, depth - 1);
                if sub.is_nullable() {
                    sub = Node::Literal('a');
                }
                Node::Repeat {
                    op: *g
                        .choose(&["*", "+", "?", "{2}", "{1,3}", "{0,2}"])
                        .unwrap(),
                    lazy: bool::arbitrary(g),
                    sub: Box::new(sub),
                }
            }
        }
    }

    fn is_nullable(&self) -> bool {
        match *self {
            Node::Literal(_) | Node::Class(_) | Node::Dot => false,
            Node::Concat(ref nodes) => nodes.iter().all(|n| n.is_nullable()),
            Node::Alternate(ref nodes) => {
                nodes.iter().any(|n| n.is_nullable())
            }
            Node::Group { ref sub, .. } => sub.is_nullable(),
            Node::Repeat { op, ref sub, .. } => {
                matches!(op, "*" | "?" | "{0,2}") || sub.is_nullable()
            }
        }
    }

    fn write(&self, out: &mut String) {
        match *self {
            Node::Literal(ch) => out.push(ch),
            Node::Class(class) => out.push_str(class),
            Node::Dot => out.push('.'),
            Node::Concat(ref nodes) => {
                for node in nodes {
                    node.write_atom(out);
                }
            }
            Node::Alternate(ref nodes) => {
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    node.write(out);
                }
            }
            Node::Group { capture, ref sub } => {
                out.push_str(if capture { "(" } else { "(?:" });
                sub.write(out);
                out.push(')');
            }
            Node::Repeat { op, lazy, ref sub } => {
                sub.write_atom(out);
                out.push_str(op);
                if lazy {
                    out.push('?');
                }
            }
        }
    }

    /// Writes this node so that it can be followed by a repetition operator
    /// or concatenated with its siblings.
    fn write_atom(&self, out: &mut String) {
        match *self {
            Node::Concat(_) | Node::Alternate(_) | Node::Repeat { .. } => {
                out.push_str("(?:");
                self.write(out);
                out.push(')');
            }
            _ => self.write(out),
        }
    }
}

impl Arbitrary for Pattern {
    fn arbitrary(g: &mut Gen) -> Pattern {
        Pattern(Node::arbitrary(g, 3))
    }
}

impl Pattern {
    fn render(&self) -> String {
        let mut out = String::new();
        self.0.write(&mut out);
        out
    }
}

/// A short haystack over the alphabet `{a, b, c}`.
#[derive(Clone, Debug)]
struct Haystack(String);

impl Arbitrary for Haystack {
    fn arbitrary(g: &mut Gen) -> Haystack {
        let len = usize::arbitrary(g) % 12;
        let alphabet = ['a', 'b', 'c'];
        let s = (0..len).map(|_| *g.choose(&alphabet).unwrap()).collect();
        Haystack(s)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Haystack>> {
        Box::new(self.0.shrink().map(Haystack))
    }
}

fn overall(re: &Regex, haystack: &str) -> Option<(usize, usize)> {
    let region = re.search(haystack).unwrap()?;
    let m = region.get_match();
    Some((m.start, m.end))
}

#[test]
fn agrees_with_regex_crate() {
    fn prop(pattern: Pattern, haystack: Haystack) -> bool {
        let pattern = pattern.render();
        let re = Regex::new(&pattern).unwrap();
        let reference = regex::Regex::new(&pattern).unwrap();
        let expected =
            reference.find(&haystack.0).map(|m| (m.start(), m.end()));
        overall(&re, &haystack.0) == expected
    }
    qc(prop as fn(Pattern, Haystack) -> bool);
}

#[test]
fn deterministic() {
    fn prop(pattern: Pattern, haystack: Haystack) -> bool {
        let re = Regex::new(&pattern.render()).unwrap();
        let first = re.search(haystack.0.as_str()).unwrap();
        let mut cache = re.create_cache();
        let input = Input::new(&haystack.0);
        let second = re.search_with(&mut cache, &input).unwrap();
        let third = re.search_with(&mut cache, &input).unwrap();
        first == second && second == third
    }
    qc(prop as fn(Pattern, Haystack) -> bool);
}

#[test]
fn slot_count() {
    fn prop(pattern: Pattern, haystack: Haystack) -> bool {
        let re = Regex::new(&pattern.render()).unwrap();
        match re.search(haystack.0.as_str()).unwrap() {
            None => true,
            Some(region) => {
                region.len() == re.group_len()
                    && region.iter().count() == re.group_len()
                    && region.get(0).is_some()
            }
        }
    }
    qc(prop as fn(Pattern, Haystack) -> bool);
}

#[test]
fn leftmost() {
    fn prop(pattern: Pattern, haystack: Haystack) -> bool {
        let re = Regex::new(&pattern.render()).unwrap();
        let h = haystack.0.as_str();
        let start = match overall(&re, h) {
            None => h.len() + 1,
            Some((start, _)) => start,
        };
        (0..start.min(h.len() + 1)).all(|at| {
            let input = Input::new(h).span(at..h.len()).anchored(true);
            re.search(input).unwrap().is_none()
        })
    }
    qc(prop as fn(Pattern, Haystack) -> bool);
}

#[test]
fn index_in_agrees_with_search() {
    fn prop(pattern: Pattern, haystack: Haystack, offset: usize) -> bool {
        let re = Regex::new(&pattern.render()).unwrap();
        let h = haystack.0.as_str();
        let offset = offset % (h.len() + 1);
        let input = Input::new(h).window(offset, h.len() - offset);
        let start = re.search(input).unwrap().map(|r| r.get_match().start);
        re.index_in(input).unwrap() == start
    }
    qc(prop as fn(Pattern, Haystack, usize) -> bool);
}

#[test]
fn memoization_is_transparent() {
    fn prop(pattern: Pattern, haystack: Haystack) -> bool {
        let pattern = pattern.render();
        let memo = Regex::new(&pattern).unwrap();
        let plain = Regex::builder()
            .configure(backtrack::Config::new().visited_capacity(0))
            .build(&pattern)
            .unwrap();
        // Too small for most windows, so only a few positions at a time
        // are remembered.
        let sliding = Regex::builder()
            .configure(backtrack::Config::new().visited_capacity(16))
            .build(&pattern)
            .unwrap();
        let h = haystack.0.as_str();
        let expected = plain.search(h).unwrap();
        memo.search(h).unwrap() == expected
            && sliding.search(h).unwrap() == expected
    }
    qc(prop as fn(Pattern, Haystack) -> bool);
}
