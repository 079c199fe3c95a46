//! Broker ranking and net accumulator/distributor lists.

use forensics_core::{BrokerProfile, RankedBroker};

/// Sort profiles by total lots descending, ties by broker code.
pub fn rank_profiles(profiles: &mut [BrokerProfile]) {
    profiles.sort_by(|a, b| {
        b.total_lot
            .cmp(&a.total_lot)
            .then_with(|| a.code().cmp(b.code()))
    });
}

/// Largest net buyers (net > 0), biggest first.
pub fn top_accumulators(profiles: &[BrokerProfile], limit: usize) -> Vec<RankedBroker> {
    let mut buyers: Vec<&BrokerProfile> = profiles.iter().filter(|p| p.net_lot() > 0).collect();
    buyers.sort_by(|a, b| {
        b.net_lot()
            .cmp(&a.net_lot())
            .then_with(|| a.code().cmp(b.code()))
    });
    buyers.into_iter().take(limit).map(to_ranked).collect()
}

/// Largest net sellers (net < 0), most negative first.
pub fn top_distributors(profiles: &[BrokerProfile], limit: usize) -> Vec<RankedBroker> {
    let mut sellers: Vec<&BrokerProfile> = profiles.iter().filter(|p| p.net_lot() < 0).collect();
    sellers.sort_by(|a, b| {
        a.net_lot()
            .cmp(&b.net_lot())
            .then_with(|| a.code().cmp(b.code()))
    });
    sellers.into_iter().take(limit).map(to_ranked).collect()
}

fn to_ranked(profile: &BrokerProfile) -> RankedBroker {
    RankedBroker {
        code: profile.code().to_string(),
        investor_type: profile.position.investor_type,
        net_lot: profile.net_lot(),
        classification: profile.classification,
    }
}
