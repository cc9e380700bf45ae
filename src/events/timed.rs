//! Timed world events.
//!
//! Every timed event shares one lifecycle: a "begins in ..." countdown,
//! optional start and progress lines, and one or more terminal lines.
//! The events differ only in their rule tables, so a single evaluator
//! drives all of them.

use crate::events::format::relative_timestamp;
use crate::events::rules::Rule;
use crate::lifecycle::upcoming::time_string_to_unix;

/// Countdown phrases that are always announced. Any other countdown
/// ("in 4 minutes", "in 10 seconds", ...) is a re-announcement and is
/// suppressed.
pub const ALLOWED_COUNTDOWNS: [&str; 3] = ["1 hour", "30 minutes", "5 minutes"];

/// Countdown capture shared by every "begins in" rule.
const COUNTDOWN: &str = r"(1 hour|\d+ minutes?|\d+ seconds?)";

/// Which timed event a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimedKind {
    Snovasion,
    Beef,
    Labyrinth,
    Abyssal,
    AttackOnGiant,
    Fox,
    Bait,
    FreeForAll,
    TeamDeathmatch,
    Castle,
}

impl TimedKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snovasion => "Snovasion",
            Self::Beef => "Beef",
            Self::Labyrinth => "Labyrinth",
            Self::Abyssal => "Abyssal",
            Self::AttackOnGiant => "AttackOnGiant",
            Self::Fox => "Fox",
            Self::Bait => "Bait",
            Self::FreeForAll => "FreeForAll",
            Self::TeamDeathmatch => "TeamDeathmatch",
            Self::Castle => "Castle",
        }
    }
}

/// Position of a line within an event's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// "... begins in N minutes."
    Upcoming,
    /// The event has started.
    Started,
    /// Intermediate result such as a placement line.
    Progress,
    /// Terminal line.
    End,
}

#[derive(Debug, Clone)]
struct PhaseRule {
    phase: Phase,
    rule: Rule,
    /// Static reward text appended to the announcement.
    reward: Option<&'static str>,
    /// Never announced.
    silent: bool,
}

impl PhaseRule {
    fn new(phase: Phase, pattern: &str) -> Self {
        Self {
            phase,
            rule: Rule::new(pattern),
            reward: None,
            silent: false,
        }
    }

    fn with_reward(mut self, reward: &'static str) -> Self {
        self.reward = Some(reward);
        self
    }

    fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

/// Rule table for one timed event.
#[derive(Debug, Clone)]
pub struct TimedEventDef {
    pub kind: TimedKind,
    /// Title recorded as the most recent event; `None` for events that
    /// are not tracked (the castle siege).
    pub title: Option<&'static str>,
    /// Rules in priority order. The first is always the countdown rule.
    rules: Vec<PhaseRule>,
}

impl TimedEventDef {
    fn new(kind: TimedKind, title: Option<&'static str>, begins_in: &str) -> Self {
        Self {
            kind,
            title,
            rules: vec![PhaseRule::new(Phase::Upcoming, begins_in)],
        }
    }

    fn rule(mut self, rule: PhaseRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Match a line against this event's rules.
    pub fn evaluate(&self, line: &str) -> Option<TimedEvent<'_>> {
        let index = self.rules.iter().position(|r| r.rule.is_match(line))?;
        let countdown = if index == 0 {
            self.rules[0].rule.capture(line, 1)
        } else {
            None
        };
        Some(TimedEvent {
            def: self,
            line: line.to_string(),
            rule_index: index,
            countdown,
        })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.rules.iter().any(|r| r.rule.is_match(line))
    }

    /// The built-in table, in matching priority order.
    pub fn builtin() -> Vec<TimedEventDef> {
        vec![
            Self::new(
                TimedKind::Snovasion,
                Some("Snovasion"),
                &format!(r"^Snovasion Event begins in {}\.", COUNTDOWN),
            )
            .rule(PhaseRule::new(Phase::Started, r"^Snowmen invade /pvp!"))
            .rule(PhaseRule::new(Phase::End, r"^Snowmen melt away!$")),
            Self::new(
                TimedKind::Beef,
                Some("Beef"),
                &format!(r"(?i)^Beef Event begins in {}\.$", COUNTDOWN),
            )
            .rule(PhaseRule::new(Phase::Started, r"(?i)^Beef has started!$"))
            .rule(PhaseRule::new(
                Phase::End,
                r"(?i)^Team (aqua|red) wins the beef event!$",
            )),
            Self::new(
                TimedKind::Labyrinth,
                Some("Labyrinth"),
                &format!(r"(?i)^Labyrinth Event begins in {}\.$", COUNTDOWN),
            )
            .rule(PhaseRule::new(Phase::Started, r"(?i)^Labyrinth event is starting\.\.\.$").silent())
            .rule(PhaseRule::new(Phase::Started, r"(?i)^Labyrinth event has started!$"))
            .rule(PhaseRule::new(Phase::End, r"(?i)^Labyrinth event has ended!$")),
            Self::new(
                TimedKind::Abyssal,
                Some("Abyssal"),
                &format!(r"^Abyssal event begins in {}\.$", COUNTDOWN),
            )
            .rule(
                PhaseRule::new(Phase::Started, r"^Abyssal event has started!$")
                    .with_reward(ABYSSAL_REWARD),
            )
            .rule(
                PhaseRule::new(
                    Phase::End,
                    r"(?i)^[a-zA-Z0-9_]{2,16} wins the abyssal event! Poseidon is pleased!$",
                )
                .with_reward(ABYSSAL_REWARD),
            ),
            Self::new(
                TimedKind::AttackOnGiant,
                Some("Attack on Giant"),
                &format!(r"(?i)^Attack on Giant Event begins in {}\.$", COUNTDOWN),
            )
            .rule(PhaseRule::new(Phase::Started, r"(?i)^Attack on Giant Event has begun!$"))
            .rule(PhaseRule::new(Phase::End, r"(?i)^Attack on Giant Event ends!$")),
            Self::new(
                TimedKind::Fox,
                Some("Fox"),
                &format!(r"(?i)^Fox Hunt Event begins in {}\.$", COUNTDOWN),
            )
            .rule(PhaseRule::new(Phase::Started, r"(?i)^Fox Hunt has begun!$"))
            .rule(
                PhaseRule::new(Phase::Progress, r"(?i)^1\) [a-zA-Z0-9_]{2,16} -- \d+ foxes$")
                    .with_reward("52 deggs, 1 forbidden cacao beans"),
            )
            .rule(
                PhaseRule::new(Phase::Progress, r"(?i)^2\) [a-zA-Z0-9_]{2,16} -- \d+ foxes$")
                    .with_reward("42 deggs"),
            )
            .rule(
                PhaseRule::new(Phase::Progress, r"(?i)^3\) [a-zA-Z0-9_]{2,16} -- \d+ foxes$")
                    .with_reward("32 deggs"),
            )
            .rule(PhaseRule::new(Phase::End, r"(?i)^Fox Hunt event ends!$")),
            Self::new(
                TimedKind::Bait,
                Some("Bait"),
                &format!(r"(?i)^Bait Event begins in {}\.$", COUNTDOWN),
            )
            .rule(PhaseRule::new(Phase::Started, r"(?i)^Bait Event has started!$"))
            .rule(PhaseRule::new(
                Phase::Progress,
                r"(?i)^[123]\) [a-zA-Z0-9_]{2,16} -- \d+ fish$",
            ))
            .rule(PhaseRule::new(Phase::End, r"(?i)^Fishing event ends!$")),
            Self::new(
                TimedKind::FreeForAll,
                Some("Free-for-all"),
                &format!(r"(?i)^Free-For-All Event begins in {}\.$", COUNTDOWN),
            )
            .rule(PhaseRule::new(
                Phase::Progress,
                r"^[123]\) [a-zA-Z0-9_]{2,16} -- \d+ kills$",
            ))
            .rule(PhaseRule::new(Phase::End, r"(?i)^Free-For-All event ends!$")),
            Self::new(
                TimedKind::TeamDeathmatch,
                Some("Team Deathmatch"),
                &format!(r"(?i)^Team Deathmatch Event begins in {}\.$", COUNTDOWN),
            )
            .rule(PhaseRule::new(
                Phase::End,
                r"^Team (aqua|red) wins the Team Deathmatch event!$",
            )),
            Self::new(
                TimedKind::Castle,
                None,
                &format!(r"(?i)^Battle for Minewind begins in {}\.(\n.*)?$", COUNTDOWN),
            )
            .rule(PhaseRule::new(
                Phase::Started,
                r"(?i)^Battle for Minewind (has started!?|has begun!?)\.?$",
            ))
            .rule(PhaseRule::new(
                Phase::End,
                r"(?i)^[a-zA-Z0-9 ]{1,64} \([a-zA-Z0-9]{1,4}\) hold the Minewind City!$",
            ))
            .rule(PhaseRule::new(
                Phase::End,
                r"(?i)^[a-zA-Z0-9 ]{1,64} \([a-zA-Z0-9]{1,4}\) take the Minewind City from [a-zA-Z0-9 ]{1,64} \([a-zA-Z0-9]{1,4}\)!(?s:.*)$",
            )),
        ]
    }
}

const ABYSSAL_REWARD: &str = "1s, 2 abyssal keys, 1 fmb, 64 gaps, 64 gold coins";

/// One raw line matched against a timed event's rules.
#[derive(Debug, Clone)]
pub struct TimedEvent<'t> {
    def: &'t TimedEventDef,
    line: String,
    rule_index: usize,
    /// Captured countdown phrase, for countdown lines.
    countdown: Option<String>,
}

impl PartialEq for TimedEvent<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.def.kind == other.def.kind
            && self.line == other.line
            && self.rule_index == other.rule_index
    }
}

impl<'t> TimedEvent<'t> {
    pub fn kind(&self) -> TimedKind {
        self.def.kind
    }

    pub fn title(&self) -> Option<&'static str> {
        self.def.title
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn phase(&self) -> Phase {
        self.def.rules[self.rule_index].phase
    }

    pub fn countdown(&self) -> Option<&str> {
        self.countdown.as_deref()
    }

    /// True iff the line is the event's "begins in ..." countdown.
    pub fn is_upcoming_announcement(&self) -> bool {
        self.phase() == Phase::Upcoming
    }

    /// True unless the line is a silent transition or a countdown
    /// outside [`ALLOWED_COUNTDOWNS`].
    pub fn should_notify(&self) -> bool {
        if self.def.rules[self.rule_index].silent {
            return false;
        }
        if !self.is_upcoming_announcement() {
            return true;
        }
        self.countdown
            .as_deref()
            .is_some_and(|c| ALLOWED_COUNTDOWNS.contains(&c))
    }

    /// True iff the line is one of the event's terminal lines.
    pub fn is_end_message(&self) -> bool {
        self.phase() == Phase::End
    }

    /// Countdown or start lines mark the event as the most recent one.
    pub fn is_begin_transition(&self) -> bool {
        matches!(self.phase(), Phase::Upcoming | Phase::Started)
    }

    /// Render the chat-side announcement.
    ///
    /// Countdowns get an absolute timestamp (when the countdown parses)
    /// followed by the role pings; other lines get their reward text.
    pub fn render(&self, ping_groups: &[u64], now_unix: i64) -> String {
        if self.is_upcoming_announcement() {
            let mut message = self.line.clone();
            if let Some(unix) = time_string_to_unix(&self.line, now_unix) {
                message.push(' ');
                message.push_str(&relative_timestamp(unix));
            }
            let pings = ping_groups
                .iter()
                .map(|id| crate::events::format::ping(*id))
                .collect::<Vec<_>>()
                .join(" ");
            if !pings.is_empty() {
                message.push(' ');
                message.push_str(&pings);
            }
            return message;
        }

        match self.def.rules[self.rule_index].reward {
            Some(reward) => format!("{} - {}", self.line, reward),
            None => self.line.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<TimedEventDef> {
        TimedEventDef::builtin()
    }

    fn evaluate<'t>(defs: &'t [TimedEventDef], line: &str) -> Option<TimedEvent<'t>> {
        defs.iter().find_map(|d| d.evaluate(line))
    }

    #[test]
    fn test_countdown_allow_list() {
        let defs = table();
        for (line, notify) in [
            ("Beef Event begins in 1 hour.", true),
            ("Beef Event begins in 30 minutes.", true),
            ("Beef Event begins in 5 minutes.", true),
            ("Beef Event begins in 4 minutes.", false),
            ("Beef Event begins in 1 minute.", false),
            ("Beef Event begins in 10 seconds.", false),
        ] {
            let event = evaluate(&defs, line).unwrap();
            assert_eq!(event.kind(), TimedKind::Beef);
            assert!(event.is_upcoming_announcement());
            assert_eq!(event.should_notify(), notify, "{}", line);
        }
    }

    #[test]
    fn test_non_countdown_lines_always_notify() {
        let defs = table();
        let event = evaluate(&defs, "Beef has started!").unwrap();
        assert_eq!(event.phase(), Phase::Started);
        assert!(event.should_notify());
        assert!(!event.is_upcoming_announcement());
        assert!(!event.is_end_message());
    }

    #[test]
    fn test_labyrinth_starting_line_is_silent() {
        let defs = table();
        let starting = evaluate(&defs, "Labyrinth event is starting...").unwrap();
        assert_eq!(starting.kind(), TimedKind::Labyrinth);
        assert!(!starting.should_notify());

        let started = evaluate(&defs, "Labyrinth event has started!").unwrap();
        assert!(started.should_notify());

        let ended = evaluate(&defs, "Labyrinth event has ended!").unwrap();
        assert!(ended.is_end_message());
    }

    #[test]
    fn test_castle_has_two_terminal_shapes() {
        let defs = table();
        let held = evaluate(&defs, "Red Lions (RL) hold the Minewind City!").unwrap();
        assert_eq!(held.kind(), TimedKind::Castle);
        assert!(held.is_end_message());

        let taken = evaluate(
            &defs,
            "Blue Bears (BB) take the Minewind City from Red Lions (RL)!\nCongratulations!",
        )
        .unwrap();
        assert!(taken.is_end_message());
        assert_eq!(taken.title(), None);
    }

    #[test]
    fn test_castle_countdown_with_trailing_line() {
        let defs = table();
        let event = evaluate(
            &defs,
            "Battle for Minewind begins in 30 minutes.\nPrepare your clan!",
        )
        .unwrap();
        assert_eq!(event.kind(), TimedKind::Castle);
        assert_eq!(event.countdown(), Some("30 minutes"));
        assert!(event.should_notify());
    }

    #[test]
    fn test_fox_placement_rewards() {
        let defs = table();
        let first = evaluate(&defs, "1) Steve -- 12 foxes").unwrap();
        assert_eq!(first.phase(), Phase::Progress);
        assert_eq!(
            first.render(&[], 0),
            "1) Steve -- 12 foxes - 52 deggs, 1 forbidden cacao beans"
        );
        let second = evaluate(&defs, "2) Alex -- 9 foxes").unwrap();
        assert_eq!(second.render(&[], 0), "2) Alex -- 9 foxes - 42 deggs");
        let third = evaluate(&defs, "3) Notch -- 3 foxes").unwrap();
        assert_eq!(third.render(&[], 0), "3) Notch -- 3 foxes - 32 deggs");
    }

    #[test]
    fn test_placement_lines_are_told_apart() {
        let defs = table();
        assert_eq!(evaluate(&defs, "1) Steve -- 4 fish").unwrap().kind(), TimedKind::Bait);
        assert_eq!(
            evaluate(&defs, "2) Steve -- 4 kills").unwrap().kind(),
            TimedKind::FreeForAll
        );
    }

    #[test]
    fn test_abyssal_winner_reward() {
        let defs = table();
        let event = evaluate(&defs, "Steve wins the abyssal event! Poseidon is pleased!").unwrap();
        assert!(event.is_end_message());
        assert!(event.render(&[], 0).ends_with(" - 1s, 2 abyssal keys, 1 fmb, 64 gaps, 64 gold coins"));
    }

    #[test]
    fn test_countdown_render_has_timestamp_and_pings() {
        let defs = table();
        let event = evaluate(&defs, "Fox Hunt Event begins in 5 minutes.").unwrap();
        let rendered = event.render(&[1016, 1000], 1_000);
        assert_eq!(
            rendered,
            "Fox Hunt Event begins in 5 minutes. <t:1300:R> <@&1016> <@&1000>"
        );
    }

    #[test]
    fn test_oversized_countdown_renders_without_timestamp() {
        let defs = table();
        let event = evaluate(&defs, "Beef Event begins in 999999999999999999 minutes.").unwrap();
        assert_eq!(
            event.render(&[1], 1_700_000_000),
            "Beef Event begins in 999999999999999999 minutes. <@&1>"
        );
    }

    #[test]
    fn test_titles() {
        let defs = table();
        assert_eq!(
            evaluate(&defs, "Attack on Giant Event has begun!").unwrap().title(),
            Some("Attack on Giant")
        );
        assert_eq!(
            evaluate(&defs, "Team red wins the Team Deathmatch event!").unwrap().title(),
            Some("Team Deathmatch")
        );
    }

    #[test]
    fn test_begin_transitions() {
        let defs = table();
        assert!(evaluate(&defs, "Snovasion Event begins in 1 hour.").unwrap().is_begin_transition());
        assert!(evaluate(&defs, "Snowmen invade /pvp! Go!").unwrap().is_begin_transition());
        let end = evaluate(&defs, "Snowmen melt away!").unwrap();
        assert!(end.is_end_message());
        assert!(!end.is_begin_transition());
        assert!(!evaluate(&defs, "1) Steve -- 4 fish").unwrap().is_begin_transition());
    }

    #[test]
    fn test_unrelated_line_matches_nothing() {
        let defs = table();
        assert!(evaluate(&defs, "Steve: hello").is_none());
    }
}
