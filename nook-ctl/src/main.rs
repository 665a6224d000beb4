use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use nook_client::{
    api::{
        AuthToken, Comment, CommentId, CommentTarget, NewComment, NookFilter, NookId, NookSort, PostId,
        ReactionKind, ReactionTarget, Scope, Temperature, TopicId, Urgency, UserId, Uuid,
    },
    format, load_post, load_profile, mentioned_usernames, Backend, ClientConfig, HttpBackend,
    MentionResolver, PostDetail, ProfileView, ReplyIndex, ThreadView,
};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Server root url, defaults to the NOOK_HOST environment variable
    #[structopt(short, long)]
    host: Option<String>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Show a page of the feed
    Feed {
        #[structopt(long, default_value = "1")]
        page: u32,
    },

    /// Toggle a reaction on a post, topic or nook message
    React {
        /// One of post, topic, nook-message
        #[structopt(parse(try_from_str = parse_reaction_type))]
        target: ReactionType,
        id: Uuid,
        kind: String,
    },

    /// Show the comments of a post or topic, or the messages of a nook, as a tree
    Comments {
        /// One of post, topic, nook
        #[structopt(parse(try_from_str = parse_comment_type))]
        target: CommentType,
        id: Uuid,
    },

    /// Show a post with its comments
    Post { id: Uuid },

    /// Send a message to a nook, mentioning users with @username
    Send {
        nook: Uuid,
        text: String,

        /// Message this one replies to
        #[structopt(long)]
        reply_to: Option<Uuid>,
    },

    /// List nooks
    Nooks {
        #[structopt(long, parse(try_from_str = parse_urgency))]
        urgency: Option<Urgency>,
        #[structopt(long, parse(try_from_str = parse_scope))]
        scope: Option<Scope>,
        #[structopt(long, parse(try_from_str = parse_temperature))]
        temperature: Option<Temperature>,
        #[structopt(long)]
        hashtag: Option<String>,
        #[structopt(long, parse(try_from_str = parse_sort), default_value = "recent")]
        sort: NookSort,
    },

    /// Show a user's profile
    Profile { user: Uuid },

    /// Find the user behind a mention
    Resolve { username: String },
}

#[derive(Clone, Copy)]
enum ReactionType {
    Post,
    Topic,
    NookMessage,
}

#[derive(Clone, Copy)]
enum CommentType {
    Post,
    Topic,
    Nook,
}

fn parse_reaction_type(s: &str) -> anyhow::Result<ReactionType> {
    match s {
        "post" => Ok(ReactionType::Post),
        "topic" => Ok(ReactionType::Topic),
        "nook-message" | "nook_message" => Ok(ReactionType::NookMessage),
        _ => Err(anyhow!("unknown reaction target {s:?}")),
    }
}

fn parse_comment_type(s: &str) -> anyhow::Result<CommentType> {
    match s {
        "post" => Ok(CommentType::Post),
        "topic" => Ok(CommentType::Topic),
        "nook" => Ok(CommentType::Nook),
        _ => Err(anyhow!("unknown comment target {s:?}")),
    }
}

fn choose<T: Copy>(
    s: &str,
    what: &str,
    choices: &[T],
    name: fn(&T) -> &'static str,
) -> anyhow::Result<T> {
    choices
        .iter()
        .find(|c| name(c) == s)
        .copied()
        .ok_or_else(|| anyhow!("unknown {what} {s:?}"))
}

fn parse_urgency(s: &str) -> anyhow::Result<Urgency> {
    choose(s, "urgency", &[Urgency::Low, Urgency::Medium, Urgency::High], Urgency::as_str)
}

fn parse_scope(s: &str) -> anyhow::Result<Scope> {
    choose(s, "scope", &[Scope::Local, Scope::Global], Scope::as_str)
}

fn parse_temperature(s: &str) -> anyhow::Result<Temperature> {
    choose(
        s,
        "temperature",
        &[Temperature::Calm, Temperature::Warm, Temperature::Hot],
        Temperature::as_str,
    )
}

fn parse_sort(s: &str) -> anyhow::Result<NookSort> {
    choose(
        s,
        "sort",
        &[NookSort::Recent, NookSort::Active, NookSort::ExpiringSoon],
        NookSort::as_str,
    )
}

fn auth_token() -> anyhow::Result<AuthToken> {
    let tok = std::env::var("NOOK_TOKEN").context("retrieving NOOK_TOKEN environment variable")?;
    let tok = Uuid::try_parse(&tok).context("parsing NOOK_TOKEN as an auth token")?;
    Ok(AuthToken(tok))
}

fn host(opt: Option<String>) -> anyhow::Result<String> {
    match opt {
        Some(h) => Ok(h),
        None => std::env::var("NOOK_HOST").context("no --host given and NOOK_HOST is not set"),
    }
}

fn print_tree(comments: &[Comment], index: &ReplyIndex, now: DateTime<Utc>) {
    for (depth, id) in index.walk() {
        if let Some(c) = comments.iter().find(|c| c.id == *id) {
            println!(
                "{}{} ({}): {}",
                "  ".repeat(*depth),
                c.author_name,
                format::relative_time(c.date, now),
                c.text
            );
        }
    }
    if !index.orphans().is_empty() {
        println!("({} replies to missing comments hidden)", index.orphans().len());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let config = ClientConfig::default();
    let backend = Arc::new(HttpBackend::new(host(opt.host)?, auth_token()?));
    let now = Utc::now();

    match opt.cmd {
        Command::Feed { page } => {
            let feed = backend
                .fetch_feed(page, config.feed_page_size)
                .await
                .context("fetching feed")?;
            for i in feed.items {
                let author = match &i.author {
                    Some(a) => a.display_name.clone(),
                    None => String::from("Anonymous"),
                };
                let headline = i
                    .title
                    .clone()
                    .unwrap_or_else(|| i.body.lines().next().unwrap_or("").to_string());
                println!(
                    "[{}] {} {} by {} ({})",
                    i.content_type.as_str(),
                    i.id,
                    headline,
                    author,
                    format::relative_time(i.date, now),
                );
                print!(
                    "    {} likes, {} comments, {} shares, {} seen",
                    format::compact_count(i.engagement.likes),
                    format::compact_count(i.engagement.comments),
                    format::compact_count(i.engagement.shares),
                    format::compact_count(i.engagement.seen),
                );
                match i.time_left {
                    Some(left) => println!(", {left}"),
                    None => println!(),
                }
            }
            if feed.has_more {
                println!("more with --page {}", feed.page + 1);
            }
        }
        Command::React { target, id, kind } => {
            let kind = ReactionKind::new(kind);
            kind.validate()?;
            let target = match target {
                ReactionType::Post => ReactionTarget::Post(PostId(id)),
                ReactionType::Topic => ReactionTarget::Topic(TopicId(id)),
                ReactionType::NookMessage => ReactionTarget::NookMessage(CommentId(id)),
            };
            backend
                .toggle_reaction(target, &kind)
                .await
                .context("toggling reaction")?;
            println!("toggled {kind}");
        }
        Command::Comments { target, id } => {
            let target = match target {
                CommentType::Post => CommentTarget::Post(PostId(id)),
                CommentType::Topic => CommentTarget::Topic(TopicId(id)),
                CommentType::Nook => CommentTarget::Nook(NookId(id)),
            };
            let comments = backend
                .list_comments(target)
                .await
                .context("listing comments")?;
            print_tree(&comments, &ReplyIndex::build(&comments), now);
        }
        Command::Post { id } => match load_post(&*backend, PostId(id)).await {
            PostDetail::Loaded {
                post,
                comments,
                index,
            } => {
                println!("{} ({})", post.body, format::relative_time(post.date, now));
                println!(
                    "    {} likes, {} comments, {} shares",
                    format::compact_count(post.engagement.likes),
                    format::compact_count(post.engagement.comments),
                    format::compact_count(post.engagement.shares),
                );
                print_tree(&comments, &index, now);
            }
            PostDetail::NotFound => return Err(anyhow!("post not found")),
        },
        Command::Send {
            nook,
            text,
            reply_to,
        } => {
            let resolver = MentionResolver::new(backend.clone(), &config);
            let mut mentioned = Vec::new();
            for username in mentioned_usernames(&text) {
                match resolver.resolve(&username).await? {
                    Some(u) => mentioned.push(u.id),
                    None => tracing::info!(%username, "mentioned user does not exist"),
                }
            }
            let thread = ThreadView::new(
                backend.clone(),
                CommentTarget::Nook(NookId(nook)),
                UserId::stub(),
                "me",
            );
            let mut message = NewComment::new(text);
            message.parent_id = reply_to.map(CommentId);
            message.mentioned_user_ids = mentioned;
            match thread.post(message).await {
                Ok(id) => println!("sent message {}", id.0),
                Err(e) => return Err(anyhow!("{}", e.user_message())),
            }
        }
        Command::Nooks {
            urgency,
            scope,
            temperature,
            hashtag,
            sort,
        } => {
            let filter = NookFilter {
                urgency,
                scope,
                temperature,
                hashtag,
                sort,
            };
            let nooks = backend.list_nooks(&filter).await.context("listing nooks")?;
            for n in nooks {
                println!(
                    "{} {} [{} {} {}] {} members, {}{}",
                    n.id.0,
                    n.title,
                    n.urgency.as_str(),
                    n.scope.as_str(),
                    n.temperature.as_str(),
                    format::compact_count(n.member_count),
                    format::time_left(n.expires_at, now),
                    match n.is_member {
                        true => " (joined)",
                        false => "",
                    },
                );
            }
        }
        Command::Profile { user } => match load_profile(&*backend, UserId(user)).await {
            ProfileView::Loaded(p) => {
                println!("{} (@{})", p.user.display_name, p.user.username);
                if let Some(bio) = &p.user.bio {
                    println!("{bio}");
                }
                println!(
                    "{} posts, {} followers, {} following",
                    format::compact_count(p.stats.posts),
                    format::compact_count(p.stats.followers),
                    format::compact_count(p.stats.following),
                );
                for b in &p.badges {
                    println!("badge: {}", b.name);
                }
                if p.follow.is_following {
                    println!("you follow this user");
                }
            }
            ProfileView::Loading | ProfileView::CouldNotLoad => {
                return Err(anyhow!("could not load this profile"));
            }
        },
        Command::Resolve { username } => {
            let resolver = MentionResolver::new(backend, &config);
            match resolver.resolve(username.trim_start_matches('@')).await? {
                Some(u) => println!("{} {} ({})", u.id.0, u.username, u.display_name),
                None => println!("no user named {username}"),
            }
        }
    }

    Ok(())
}
