//! Line classification.
//!
//! Every raw game line lands in exactly one [`Variant`]. Stages are tried
//! in a fixed priority order and the first match wins; [`Variant::Debug`]
//! catches whatever is left.

use crate::events::chat::{chat_rules, ChatLine};
use crate::events::format::{code_block, escape_code_block};
use crate::events::rules::{Rule, RuleSet};
use crate::events::timed::{TimedEvent, TimedEventDef};

/// Event-independent broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialKind {
    Vote,
    Welcome,
    Sharpening,
}

impl SocialKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vote => "Vote",
            Self::Welcome => "Welcome",
            Self::Sharpening => "Sharpening",
        }
    }
}

/// The category a raw line belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant<'t> {
    Social {
        kind: SocialKind,
        line: String,
        user: Option<String>,
    },
    Timed(TimedEvent<'t>),
    /// Server housekeeping, never forwarded.
    System(String),
    Death(String),
    Chat(ChatLine),
    /// No other stage matched.
    Debug(String),
}

impl Variant<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Social { kind, .. } => kind.name(),
            Self::Timed(event) => event.kind().name(),
            Self::System(_) => "System",
            Self::Death(_) => "Death",
            Self::Chat(_) => "Chat",
            Self::Debug(_) => "Debug",
        }
    }

    pub fn line(&self) -> &str {
        match self {
            Self::Social { line, .. } => line,
            Self::Timed(event) => event.line(),
            Self::System(line) | Self::Death(line) | Self::Debug(line) => line,
            Self::Chat(chat) => &chat.line,
        }
    }
}

/// Plain fenced rendering used by the social, death and debug channels.
pub fn render_plain(line: &str) -> String {
    code_block(&escape_code_block(line))
}

enum Stage {
    Social(SocialKind, Rule),
    Timed,
    System(RuleSet),
    Death(RuleSet),
    Chat(RuleSet),
}

/// The full recognition table.
pub struct Taxonomy {
    stages: Vec<Stage>,
    timed: Vec<TimedEventDef>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new()
    }
}

impl Taxonomy {
    pub fn new() -> Self {
        Self {
            stages: vec![
                Stage::Social(SocialKind::Vote, Rule::new(VOTE)),
                Stage::Social(SocialKind::Welcome, Rule::new(WELCOME)),
                Stage::Social(SocialKind::Sharpening, Rule::new(SHARPENING)),
                Stage::Timed,
                Stage::System(RuleSet::new(SYSTEM)),
                Stage::Death(RuleSet::new(DEATH)),
                Stage::Chat(chat_rules()),
            ],
            timed: TimedEventDef::builtin(),
        }
    }

    pub fn classify(&self, line: &str) -> Variant<'_> {
        for stage in &self.stages {
            match stage {
                Stage::Social(kind, rule) => {
                    if rule.is_match(line) {
                        return Variant::Social {
                            kind: *kind,
                            line: line.to_string(),
                            user: rule.capture(line, 1),
                        };
                    }
                }
                Stage::Timed => {
                    if let Some(event) = self.timed.iter().find_map(|def| def.evaluate(line)) {
                        return Variant::Timed(event);
                    }
                }
                Stage::System(rules) => {
                    if rules.is_match(line) {
                        return Variant::System(line.to_string());
                    }
                }
                Stage::Death(rules) => {
                    if rules.is_match(line) {
                        return Variant::Death(line.to_string());
                    }
                }
                Stage::Chat(rules) => {
                    if rules.is_match(line) {
                        return Variant::Chat(ChatLine::new(line));
                    }
                }
            }
        }
        Variant::Debug(line.to_string())
    }
}

const VOTE: &str = r"^/vote -> ([a-zA-Z0-9_]{2,16}): (.*)$";
const WELCOME: &str = r"^Welcome ([a-zA-Z0-9_]{2,16})!$";
const SHARPENING: &str = r"^([a-zA-Z0-9_]{2,16}) sharpened (.*) to \+(\d+)!$";

const SYSTEM: &[&str] = &[
    r"^Your /chatlevel is \w+$",
    r"^You have (\d+ )?new mail. Try /claim$",
    r"^You have \d+ rewards? to /claim$",
    r"^Visit Minewind\.com for News and Information$",
    r"^Have an idea to better the server\? Minewind\.com/feedback$",
    r"^Report bugs at Minewind\.com/bugs$",
];

const DEATH: &[&str] = &[
    r"^[a-zA-Z0-9_]{2,16} is on RAMPAGE!+$",
    r"^[a-zA-Z0-9_]{2,16} died$",
    r"^[a-zA-Z0-9_]{2,16} starved to death( while fighting .*)?$",
    r"^[a-zA-Z0-9_]{2,16} drowned( while trying to escape .*)?$",
    r"^[a-zA-Z0-9_]{2,16} blew up$",
    r"^[a-zA-Z0-9_]{2,16} self-disintegrated$",
    r"^[a-zA-Z0-9_]{2,16} was pricked to death$",
    r"^[a-zA-Z0-9_]{2,16} died to the void \(Death #\d+\)$",
    r"^[a-zA-Z0-9_]{2,16} went up in flames$",
    r"^[a-zA-Z0-9_]{2,16} fell off a ladder$",
    r"^[a-zA-Z0-9_]{2,16} burned to death$",
    r"^[a-zA-Z0-9_]{2,16} went off with a bang( due to a firework fired from .*)?$",
    r"^[a-zA-Z0-9_]{2,16} froze to death$",
    r"^[a-zA-Z0-9_]{2,16} lost \d+ fish as they teleported away$",
    r"^[a-zA-Z0-9_]{2,16} was frozen to death by .*$",
    r"^[a-zA-Z0-9_]{2,16} pwned [a-zA-Z0-9_]{2,16} for \d+!$",
    r"^[a-zA-Z0-9_]{2,16} rekt [a-zA-Z0-9_]{2,16} for \d+ fish$",
    r"^[a-zA-Z0-9_]{2,16} got \d+ (fish|kills) from [a-zA-Z0-9_]{2,16} as they ran away$",
    r"^[a-zA-Z0-9_]{2,16} lost \d+ (fish|kills) as they ran away$",
    r"^[a-zA-Z0-9_]{2,16} was stung to death$",
    r"^[a-zA-Z0-9_]{2,16} was obliterated by a sonically-charged shriek$",
    r"^[a-zA-Z0-9_]{2,16} was poked to death by a sweet berry bush( while trying to escape .*)?$",
    r"^[a-zA-Z0-9_]{2,16} was struck by lightning( while fighting .*)?$",
    r"^[a-zA-Z0-9_]{2,16} committed blood sacrifice$",
    r"^[a-zA-Z0-9_]{2,16} discovered the floor was lava$",
    r"^[a-zA-Z0-9_]{2,16} didn't want to live in the same world as .*$",
    r"^[a-zA-Z0-9_]{2,16} tried to swim in lava( to escape .*)?$",
    r"^[a-zA-Z0-9_]{2,16} withered away( while fighting .*)?$",
    r"^[a-zA-Z0-9_]{2,16} suffocated in a wall( while fighting .*)?$",
    r"^[a-zA-Z0-9_]{2,16} fell out of the world$",
    r"^[a-zA-Z0-9_]{2,16} fell off some vines$",
    r"^[a-zA-Z0-9_]{2,16} hit the ground too hard( while trying to escape .*)?$",
    r"^[a-zA-Z0-9_]{2,16} was killed by magic$",
    r"^[a-zA-Z0-9_]{2,16} was killed by .* while trying to hurt [a-zA-Z0-9_]{2,16}$",
    r"^[a-zA-Z0-9_]{2,16} was doomed to fall( by .*)?$",
    r"^[a-zA-Z0-9_]{2,16} was doomed to fall( because of .*)?$",
    r"^[a-zA-Z0-9_]{2,16} fell from a high place$",
    r"(?i)^[a-zA-Z0-9_]{2,16} rekt [a-zA-Z0-9_]{2,16} (using .*)?(for \d+ (kills))?(and got an? (double|TRIPLE|ULTRA) kill!)?$",
    r"^[a-zA-Z0-9_]{2,16} was (killed|rekt|slain|shot|cursed|blown up|fireballed|fragged|zapped|zeused|lavaed|spirited away|Dragon Pounced|grug stomped|sparked|batted) by [a-zA-Z0-9_' ]{2,32}.*?$",
    r"^[a-zA-Z0-9_]{2,16} was impaled by [a-zA-Z0-9_' ]{2,32}( with .*)?$",
    r"^[a-zA-Z0-9_]{2,16} was rekt by [a-zA-Z0-9_]{2,16}'s (Elder Branch|Master Blaze) using .*$",
    r"^[a-zA-Z0-9_]{2,16} experienced kinetic energy( while trying to escape .*)?$",
    r"^[a-zA-Z0-9_]{2,16} died because of [a-zA-Z0-9_]{2,16}('s .*)?$",
    r"^[a-zA-Z0-9_]{2,16} sucked [a-zA-Z0-9_]{2,16} dry$",
    r"^[a-zA-Z0-9_]{2,16} borrowed soul of [a-zA-Z0-9_]{2,16}$",
    r"^[a-zA-Z0-9_]{2,16} beefed [a-zA-Z0-9_]{2,16} for \d+!$",
    r"^[a-zA-Z0-9_]{2,16} walked into the danger zone due to [a-zA-Z0-9_]{2,16}$",
    r"^[a-zA-Z0-9_]{2,16} was burned to a crisp while fighting .*$",
    r"^[a-zA-Z0-9_]{2,16} was killed by magic while trying to escape [a-zA-Z0-9_]{2,16}$",
    r"^[a-zA-Z0-9_]{2,16} was (forked|chickened|blown up) by [a-zA-Z0-9_]{2,16}$",
    r"^[a-zA-Z0-9_]{2,16} walked into fire while fighting (.*)?$",
];
