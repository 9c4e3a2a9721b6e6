use std::collections::HashMap;
use crate::data_loader::{Event, EventContribution, Match, Team, WonMatchContribution};
use crate::ranking_context::{RankingContext, TimeWindow};
use crate::util::*;

// Derives every seed modifier from the loaded matches and events. All modifiers end up in [0, 1].
pub fn compute_modifiers(teams: &mut [Team], matches: &[Match], events: &[Event], window: &TimeWindow, ranking_context: &RankingContext) {
    let team_count = teams.len();

    // Phase 1: Own Network. Each distinct beaten opponent counts once, at the best information content of those wins
    let mut own_network = vec![0.0; team_count];
    for (idx, network) in own_network.iter_mut().enumerate() {
        let mut opponents: HashMap<usize, f64> = HashMap::new();

        for m in matches {
            if m.winner() != idx { continue; } // We only go through winning matches

            let info = opponents.entry(m.loser()).or_insert(0.0);
            *info = f64::max(*info, m.information_content);
        }

        *network = opponents.values().sum();
    }

    // Phase 2: Bounty Offered, i.e. prize money earned, discounted by how long ago the event ended
    let mut winnings = vec![0.0; team_count];
    let mut event_contributions: Vec<Vec<EventContribution>> = vec![Vec::new(); team_count];
    for (ev_index, ev) in events.iter().enumerate() {
        let scale = window.time_mod(ev.last_match_time);

        for pd in &ev.prize_distribution {
            let Some(team) = pd.core_team else { continue; };
            let prize = pd.prize.max(0.0);
            winnings[team] += prize.sqrt() * scale;

            // A merged core can hold more than one placing at the same event
            match event_contributions[team].iter().position(|c| c.event_id == ev_index) {
                Some(pos) => event_contributions[team][pos].winnings += prize,
                None => event_contributions[team].push(EventContribution {
                    event_id: ev_index,
                    event_name: ev.name.clone(),
                    winnings: prize,
                    discount: scale,
                    discounted_winnings: 0.0,
                    normalized_winnings: 0.0,
                }),
            }
        }
    }

    let reference_winnings = nth_highest(&winnings, ranking_context.top_outlier_count, |w| *w);
    let reference_network  = nth_highest(&own_network, ranking_context.top_outlier_count, |n| *n);

    for (idx, (t, mut placings)) in teams.iter_mut().zip(event_contributions).enumerate() {
        t.modifiers.bounty_offered = normalize_to_reference(winnings[idx], reference_winnings);
        t.modifiers.own_network    = normalize_to_reference(own_network[idx], reference_network);

        for c in &mut placings {
            c.discounted_winnings = c.winnings * c.discount;
            c.normalized_winnings = normalize_to_reference(c.winnings.sqrt() * c.discount, reference_winnings);
        }
        t.event_contributions = placings;
    }

    // Stakes of an event: its prize pool against the reference pool, same outlier rule as above
    let reference_prize_pool = nth_highest(events, ranking_context.top_outlier_count, |ev| ev.prize_pool);

    // Phase 3: Go through won matches again to collect bounties and opponent networks, plus LAN wins
    let bucket = ranking_context.factor_bucket_size;
    let mut opponent_winnings = vec![0.0; team_count];
    let mut opponent_network  = vec![0.0; team_count];
    let mut lan_factor        = vec![0.0; team_count];
    let mut contributions: Vec<Vec<WonMatchContribution>> = vec![Vec::new(); team_count];

    for idx in 0..team_count {
        let mut opp_winnings = Vec::new();
        let mut opp_networks = Vec::new();
        let mut lan_wins = Vec::new();

        for m in matches {
            if m.winner() != idx { continue; }

            let opponent = &teams[m.loser()];
            let bounty = opponent.modifiers.bounty_offered * m.information_content;
            opp_winnings.push(bounty);
            opp_networks.push(opponent.modifiers.own_network * m.information_content);
            if m.is_lan {
                lan_wins.push(m.information_content);
            }

            let event = &events[m.event_id];
            contributions[idx].push(WonMatchContribution {
                match_start_time: m.match_start_time,
                event_name: event.name.clone(),
                opponent: opponent.name.clone(),
                bounty,
                opponent_winnings: opponent.modifiers.bounty_offered,
                prize_pool: event.prize_pool,
                stakes_modifier: normalize_to_reference(event.prize_pool, reference_prize_pool),
                time_modifier: window.time_mod(m.match_start_time),
                information_content: m.information_content,
            });
        }

        opponent_winnings[idx] = sum_of_nth_best(opp_winnings, bucket);
        opponent_network[idx]  = sum_of_nth_best(opp_networks, bucket);
        lan_factor[idx]        = sum_of_nth_best(lan_wins, bucket) / bucket as f64;
    }

    let reference_opp_winnings = nth_highest(&opponent_winnings, ranking_context.top_outlier_count, |w| *w);
    let reference_opp_network  = nth_highest(&opponent_network, ranking_context.top_outlier_count, |n| *n);

    for (idx, (t, won)) in teams.iter_mut().zip(contributions).enumerate() {
        t.modifiers.bounty_collected = curve_function(normalize_to_reference(opponent_winnings[idx], reference_opp_winnings));
        t.modifiers.opponent_network = curve_function(normalize_to_reference(opponent_network[idx], reference_opp_network));
        t.modifiers.lan_factor       = lan_factor[idx];
        t.won_match_contributions    = won;
    }
}
