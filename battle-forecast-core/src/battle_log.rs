use crate::sim::battle::Side;
use serde_json::json;

/// Ordered, human-readable record of one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BattleLog {
    lines: Vec<String>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn log_move(&mut self, side: Side, species: &str, move_name: &str) {
        self.lines
            .push(format!("[{}] {species} used {move_name}!", side.label()));
    }

    pub fn log_switch(&mut self, side: Side, outgoing: &str, incoming: &str) {
        self.lines.push(format!(
            "[{}] {outgoing} was switched out for {incoming}.",
            side.label()
        ));
    }

    pub fn log_cant_move(&mut self, side: Side, species: &str, reason: &str) {
        self.lines
            .push(format!("[{}] {species} {reason}", side.label()));
    }

    pub fn log_damage(&mut self, species: &str, dealt: u16, hp: u16, max_hp: u16) {
        self.lines
            .push(format!("{species} took {dealt} damage ({hp}/{max_hp})."));
    }

    pub fn log_heal(&mut self, species: &str, healed: u16, hp: u16, max_hp: u16) {
        self.lines
            .push(format!("{species} restored {healed} HP ({hp}/{max_hp})."));
    }

    pub fn log_status(&mut self, species: &str, status: &str) {
        self.lines.push(format!("{species} is {status}!"));
    }

    pub fn log_faint(&mut self, species: &str) {
        self.lines.push(format!("{species} fainted!"));
    }

    pub fn log_fail(&mut self) {
        self.lines.push("But it failed!".to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn extend(&mut self, other: BattleLog) {
        self.lines.extend(other.lines);
    }

    /// Index of the first line containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.contains(needle))
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({ "log": self.lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_keep_order_and_side_tags() {
        let mut log = BattleLog::new();
        log.log_move(Side::Player, "Fastmon", "Tackle");
        log.log_move(Side::Ai, "Slowmon", "Growl");
        assert_eq!(log.lines()[0], "[PLAYER] Fastmon used Tackle!");
        assert_eq!(log.position("[AI]"), Some(1));
        assert_eq!(log.to_json()["log"][1], "[AI] Slowmon used Growl!");
    }
}
