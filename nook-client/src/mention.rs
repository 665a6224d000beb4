use pest::Parser;

#[derive(pest_derive::Parser)]
#[grammar = "mention.pest"]
struct MentionParser;

/// A piece of free text
///
/// Concatenating the literal text of all segments returned by [`tokenize`]
/// gives back the original input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Text(String),

    /// Username, without the leading `@`
    Mention(String),
}

impl Segment {
    pub fn literal(&self) -> String {
        match self {
            Segment::Text(t) => t.clone(),
            Segment::Mention(u) => format!("@{u}"),
        }
    }

    pub fn as_mention(&self) -> Option<&str> {
        match self {
            Segment::Mention(u) => Some(u),
            Segment::Text(_) => None,
        }
    }
}

/// Split `text` into literal runs and `@username` mentions
///
/// Never performs any I/O: resolving the usernames is up to the caller.
pub fn tokenize(text: &str) -> Vec<Segment> {
    let mut pairs = match MentionParser::parse(Rule::text, text) {
        Ok(pairs) => pairs,
        Err(err) => {
            // the grammar accepts any input, so this is a bug in the grammar
            tracing::error!(?err, "failed tokenizing mentions");
            return match text.is_empty() {
                true => Vec::new(),
                false => vec![Segment::Text(String::from(text))],
            };
        }
    };
    let mut res = Vec::new();
    let mut run_start = None;
    let inner = match pairs.next() {
        Some(p) => p.into_inner(),
        None => return res,
    };
    for p in inner {
        match p.as_rule() {
            Rule::space | Rule::literal => {
                run_start.get_or_insert(p.as_span().start());
            }
            Rule::mention => {
                if let Some(start) = run_start.take() {
                    res.push(Segment::Text(String::from(&text[start..p.as_span().start()])));
                }
                let username = &p.as_str()[1..];
                res.push(Segment::Mention(String::from(username)));
            }
            Rule::EOI => (),
            r => unreachable!("mention tokenizer unexpected rule: {:?}", r),
        }
    }
    if let Some(start) = run_start {
        res.push(Segment::Text(String::from(&text[start..])));
    }
    res
}

/// Usernames mentioned in `text`, in order of appearance, without duplicates
pub fn mentioned_usernames(text: &str) -> Vec<String> {
    let mut res: Vec<String> = Vec::new();
    for s in tokenize(text) {
        if let Segment::Mention(u) = s {
            if !res.contains(&u) {
                res.push(u);
            }
        }
    }
    res
}
