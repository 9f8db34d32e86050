//! Elimination bracket construction.
//!
//! Builds the match-dependency tree for single and double elimination from a
//! best-first entrant list, wiring `previous_left`/`previous_right` pointers
//! from child matches to their parent and `winner_next`/`loser_next` from each
//! match to the match its outcome feeds.
//!
//! Construction happens in two passes: a template graph sized to the next
//! power of two, then a contraction pass that removes byes (a match with one
//! real feeder is dropped and the feeder forwarded to the parent) while
//! materializing `Match` records in dependency order.

use thiserror::Error;

use crate::models::{EntityId, EventId, Match, MatchId, TeamId};

/// Errors from bracket construction.
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("cannot build a bracket with {0} entrants; at least 2 are required")]
    TooFewEntrants(usize),
}

/// One bracket entrant, best-first. `team` is None for league playoff
/// skeletons whose slots await seeding from standings.
#[derive(Debug, Clone)]
pub struct Entrant {
    pub team: Option<TeamId>,
    /// Seed number (higher = stronger).
    pub seed: u32,
}

impl Entrant {
    pub fn team(team: TeamId, seed: u32) -> Self {
        Self {
            team: Some(team),
            seed,
        }
    }

    pub fn slot(seed: u32) -> Self {
        Self { team: None, seed }
    }
}

/// Where a template match's side comes from.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// Entrant index into the best-first list; indices past the entrant
    /// count are byes.
    Seed(usize),
    Winner(usize),
    Loser(usize),
}

#[derive(Debug)]
struct TemplateMatch {
    left: Source,
    right: Source,
    losers_bracket: bool,
}

/// Resolution of a template side after bye contraction.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Entrant(usize),
    WinnerOf(usize),
    LoserOf(usize),
    Void,
}

/// What became of a template match.
#[derive(Debug, Clone, Copy)]
enum Resolution {
    Kept(usize),
    Forwarded(Slot),
    Void,
}

/// Standard power-of-two seeding order: index i holds the entrant index
/// placed at leaf position i, so position pairs meet best-vs-worst.
fn seeding_order(size: usize) -> Vec<usize> {
    let mut order = vec![0usize];
    let mut len = 1;
    while len < size {
        len *= 2;
        let mut next = Vec::with_capacity(len);
        for &x in &order {
            next.push(x);
            next.push(len - 1 - x);
        }
        order = next;
    }
    order
}

fn next_power_of_two(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p *= 2;
    }
    p
}

/// Build the template graph for `bracket_size` slots.
fn build_template(bracket_size: usize, double: bool) -> Vec<TemplateMatch> {
    let mut template = Vec::new();
    let order = seeding_order(bracket_size);

    // Winner bracket, round by round.
    let mut winner_rounds: Vec<Vec<usize>> = Vec::new();
    let mut matches_in_round = bracket_size / 2;
    let mut round = 0;
    while matches_in_round >= 1 {
        let mut ids = Vec::with_capacity(matches_in_round);
        for j in 0..matches_in_round {
            let (left, right) = if round == 0 {
                (Source::Seed(order[2 * j]), Source::Seed(order[2 * j + 1]))
            } else {
                let prev = &winner_rounds[round - 1];
                (Source::Winner(prev[2 * j]), Source::Winner(prev[2 * j + 1]))
            };
            ids.push(template.len());
            template.push(TemplateMatch {
                left,
                right,
                losers_bracket: false,
            });
        }
        winner_rounds.push(ids);
        matches_in_round /= 2;
        round += 1;
    }

    if !double {
        return template;
    }

    // Losers bracket: alternate pairing surviving losers among themselves
    // (major rounds) and against the next winner-bracket round's losers
    // (minor rounds).
    let total_rounds = winner_rounds.len();
    let mut survivors: Vec<Source> = winner_rounds[0].iter().map(|&m| Source::Loser(m)).collect();

    let pair_round = |sources: Vec<Source>, template: &mut Vec<TemplateMatch>| -> Vec<Source> {
        let mut out = Vec::with_capacity(sources.len() / 2);
        for pair in sources.chunks(2) {
            let idx = template.len();
            template.push(TemplateMatch {
                left: pair[0],
                right: pair[1],
                losers_bracket: true,
            });
            out.push(Source::Winner(idx));
        }
        out
    };

    if survivors.len() > 1 {
        survivors = pair_round(survivors, &mut template);
    }
    for r in 1..total_rounds {
        let incoming: Vec<Source> = winner_rounds[r].iter().map(|&m| Source::Loser(m)).collect();
        let merged: Vec<Source> = incoming
            .into_iter()
            .zip(survivors)
            .flat_map(|(a, b)| [a, b])
            .collect();
        survivors = pair_round(merged, &mut template);
        if survivors.len() > 1 {
            survivors = pair_round(survivors, &mut template);
        }
    }

    // Grand final: winner-bracket champion vs losers-bracket champion,
    // followed by the reset slot both grand-final outcomes feed into.
    let wb_final = *winner_rounds.last().unwrap().last().unwrap();
    let grand_final = template.len();
    template.push(TemplateMatch {
        left: Source::Winner(wb_final),
        right: survivors[0],
        losers_bracket: false,
    });
    template.push(TemplateMatch {
        left: Source::Winner(grand_final),
        right: Source::Loser(grand_final),
        losers_bracket: false,
    });

    template
}

/// Build an elimination bracket from a best-first entrant list.
///
/// Returns the created matches in dependency order (feeders before parents).
/// Byes are contracted away, so single elimination yields `n - 1` matches and
/// double elimination at most `2n - 1`.
pub fn build_bracket(
    event_id: &EventId,
    entrants: &[Entrant],
    double: bool,
) -> Result<Vec<Match>, BracketError> {
    let n = entrants.len();
    if n < 2 {
        return Err(BracketError::TooFewEntrants(n));
    }

    let bracket_size = next_power_of_two(n);
    let template = build_template(bracket_size, double);
    let tag = if double { "de" } else { "se" };

    let mut resolutions: Vec<Resolution> = Vec::with_capacity(template.len());
    let mut matches: Vec<Match> = Vec::new();

    let resolve = |source: Source, resolutions: &[Resolution]| -> Slot {
        match source {
            Source::Seed(i) => {
                if i < n {
                    Slot::Entrant(i)
                } else {
                    Slot::Void
                }
            }
            Source::Winner(t) => match resolutions[t] {
                Resolution::Kept(m) => Slot::WinnerOf(m),
                Resolution::Forwarded(slot) => slot,
                Resolution::Void => Slot::Void,
            },
            Source::Loser(t) => match resolutions[t] {
                Resolution::Kept(m) => Slot::LoserOf(m),
                // A contracted match was never played, so it has no loser.
                Resolution::Forwarded(_) | Resolution::Void => Slot::Void,
            },
        }
    };

    for (t, tmpl) in template.iter().enumerate() {
        let left = resolve(tmpl.left, &resolutions);
        let right = resolve(tmpl.right, &resolutions);

        let resolution = match (&left, &right) {
            (Slot::Void, Slot::Void) => Resolution::Void,
            (Slot::Void, slot) | (slot, Slot::Void) => Resolution::Forwarded(*slot),
            _ => {
                let id = EntityId::generate(&[event_id.as_str(), tag, &t.to_string()]);
                let mut m = Match::new(id);
                m.losers_bracket = tmpl.losers_bracket;
                wire_side(&mut m, &mut matches, entrants, left, true);
                wire_side(&mut m, &mut matches, entrants, right, false);
                matches.push(m);
                Resolution::Kept(matches.len() - 1)
            }
        };
        resolutions.push(resolution);
    }

    Ok(matches)
}

/// Attach one resolved slot to a match side, wiring bracket pointers into the
/// feeder when the slot comes from an earlier match.
fn wire_side(m: &mut Match, matches: &mut [Match], entrants: &[Entrant], slot: Slot, left: bool) {
    let feeder_id: Option<MatchId> = match slot {
        Slot::Entrant(i) => {
            let entrant = &entrants[i];
            if left {
                m.team1 = entrant.team.clone();
                m.team1_seed = entrant.team.is_none().then_some(entrant.seed);
            } else {
                m.team2 = entrant.team.clone();
                m.team2_seed = entrant.team.is_none().then_some(entrant.seed);
            }
            None
        }
        Slot::WinnerOf(f) => {
            matches[f].winner_next = Some(m.id.clone());
            Some(matches[f].id.clone())
        }
        Slot::LoserOf(f) => {
            matches[f].loser_next = Some(m.id.clone());
            Some(matches[f].id.clone())
        }
        Slot::Void => None,
    };
    if left {
        m.previous_left = feeder_id;
    } else {
        m.previous_right = feeder_id;
    }
}

/// The bracket root: the match no winner advances out of.
pub fn bracket_root(matches: &[&Match]) -> Option<MatchId> {
    matches
        .iter()
        .find(|m| m.winner_next.is_none())
        .map(|m| m.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entrants(n: usize) -> Vec<Entrant> {
        (0..n)
            .map(|i| Entrant::team(EntityId::from(format!("t-{}", i)), (n - i) as u32))
            .collect()
    }

    fn event_id() -> EventId {
        EntityId::from("evt-bracket")
    }

    #[test]
    fn test_rejects_fewer_than_two_entrants() {
        assert!(build_bracket(&event_id(), &entrants(1), false).is_err());
        assert!(build_bracket(&event_id(), &[], true).is_err());
    }

    #[test]
    fn test_single_elimination_match_counts() {
        for n in 2..=16 {
            let matches = build_bracket(&event_id(), &entrants(n), false).unwrap();
            assert_eq!(matches.len(), n - 1, "n = {}", n);
        }
    }

    #[test]
    fn test_double_elimination_match_counts() {
        // Power-of-two fields have no byes: winner bracket, losers bracket,
        // grand final, and the reset slot total 2n - 1.
        for n in [2, 4, 8, 16] {
            let matches = build_bracket(&event_id(), &entrants(n), true).unwrap();
            assert_eq!(matches.len(), 2 * n - 1, "n = {}", n);
        }
        // Byes only remove matches.
        for n in [3, 5, 6, 7, 9, 12] {
            let matches = build_bracket(&event_id(), &entrants(n), true).unwrap();
            assert!(matches.len() <= 2 * n - 1, "n = {}", n);
        }
    }

    #[test]
    fn test_four_team_single_pairings() {
        // Best-first entrants: seeds 4,3,2,1. Semifinals pair 1v4 and 2v3.
        let e = entrants(4);
        let matches = build_bracket(&event_id(), &e, false).unwrap();
        assert_eq!(matches.len(), 3);

        let semi1 = &matches[0];
        assert_eq!(semi1.team1, e[0].team);
        assert_eq!(semi1.team2, e[3].team);
        let semi2 = &matches[1];
        assert_eq!(semi2.team1, e[1].team);
        assert_eq!(semi2.team2, e[2].team);

        let final_match = &matches[2];
        assert_eq!(final_match.previous_left, Some(semi1.id.clone()));
        assert_eq!(final_match.previous_right, Some(semi2.id.clone()));
        assert_eq!(semi1.winner_next, Some(final_match.id.clone()));
        assert_eq!(semi2.winner_next, Some(final_match.id.clone()));
        assert!(final_match.winner_next.is_none());
    }

    #[test]
    fn test_bye_advances_top_seed_without_playing() {
        // 3 entrants in a 4-slot bracket: the best seed's round-1 match is a
        // bye, so they appear directly in the final.
        let e = entrants(3);
        let matches = build_bracket(&event_id(), &e, false).unwrap();
        assert_eq!(matches.len(), 2);

        let semi = &matches[0];
        assert_eq!(semi.team1, e[1].team);
        assert_eq!(semi.team2, e[2].team);

        let final_match = &matches[1];
        assert_eq!(final_match.team1, e[0].team);
        assert_eq!(final_match.previous_left, None);
        assert_eq!(final_match.previous_right, Some(semi.id.clone()));
    }

    #[test]
    fn test_double_elimination_wiring() {
        let e = entrants(4);
        let matches = build_bracket(&event_id(), &e, true).unwrap();
        assert_eq!(matches.len(), 7);

        let losers: Vec<&Match> = matches.iter().filter(|m| m.losers_bracket).collect();
        assert_eq!(losers.len(), 2);

        // The reset slot is the root: both grand-final outcomes feed it.
        let reset = matches.last().unwrap();
        assert!(reset.winner_next.is_none());
        assert_eq!(reset.previous_left, reset.previous_right);
        let grand_final = &matches[matches.len() - 2];
        assert_eq!(reset.previous_left, Some(grand_final.id.clone()));
        assert_eq!(grand_final.winner_next, Some(reset.id.clone()));
        assert_eq!(grand_final.loser_next, Some(reset.id.clone()));

        // Every other match sends its loser somewhere or is a losers-bracket
        // match.
        for m in &matches {
            if m.id != reset.id && m.id != grand_final.id && !m.losers_bracket {
                assert!(m.loser_next.is_some(), "match {} drops nowhere", m.id);
            }
        }

        // The grand final joins both bracket champions, and the winner-bracket
        // final's loser drops into the losers final.
        let wb_final = matches
            .iter()
            .find(|m| !m.losers_bracket && m.winner_next == Some(grand_final.id.clone()))
            .unwrap();
        let lb_final = matches
            .iter()
            .find(|m| m.losers_bracket && m.winner_next == Some(grand_final.id.clone()))
            .unwrap();
        assert_eq!(wb_final.loser_next, Some(lb_final.id.clone()));
    }

    #[test]
    fn test_placeholder_entrants_carry_seeds() {
        let slots: Vec<Entrant> = (0..4).map(|i| Entrant::slot(4 - i)).collect();
        let matches = build_bracket(&event_id(), &slots, false).unwrap();

        let semi1 = &matches[0];
        assert_eq!(semi1.team1, None);
        assert_eq!(semi1.team1_seed, Some(4));
        assert_eq!(semi1.team2_seed, Some(1));
        let semi2 = &matches[1];
        assert_eq!(semi2.team1_seed, Some(3));
        assert_eq!(semi2.team2_seed, Some(2));
    }

    #[test]
    fn test_seeding_order_shape() {
        assert_eq!(seeding_order(1), vec![0]);
        assert_eq!(seeding_order(2), vec![0, 1]);
        assert_eq!(seeding_order(4), vec![0, 3, 1, 2]);
        assert_eq!(seeding_order(8), vec![0, 7, 3, 4, 1, 6, 2, 5]);
    }

    #[test]
    fn test_deterministic_ids() {
        let a = build_bracket(&event_id(), &entrants(8), true).unwrap();
        let b = build_bracket(&event_id(), &entrants(8), true).unwrap();
        let ids_a: Vec<_> = a.iter().map(|m| m.id.clone()).collect();
        let ids_b: Vec<_> = b.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_bracket_root() {
        let matches = build_bracket(&event_id(), &entrants(8), false).unwrap();
        let refs: Vec<&Match> = matches.iter().collect();
        let root = bracket_root(&refs).unwrap();
        assert_eq!(root, matches.last().unwrap().id);
    }
}
