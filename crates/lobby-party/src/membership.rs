//! Membership transitions.
//!
//! Joining and leaving are the only operations that change a party's member
//! list. Both live here so the compatibility rules the game client expects
//! are written down once:
//!
//! - after a join the captain's `joinrequestusers_j` lists every member and
//!   the party's `RawSquadAssignments_j` numbers members in list order;
//! - the captain is then moved to the end of the member list;
//! - when the captain leaves, the first remaining member is promoted.

use serde::Serialize;

use lobby_types::party::{META_JOIN_REQUEST_USERS, META_SQUAD_ASSIGNMENTS};
use lobby_types::{AccountId, Party, PartyMember, Role};

/// Platform reported for every join-request user.
const JOIN_REQUEST_PLATFORM: &str = "WIN";

/// Opaque per-user data the client expects in a join request.
const JOIN_REQUEST_DATA: &str = r#"{"CrossplayPreference_i":"1"}"#;

#[derive(Serialize)]
struct JoinRequestUsers<'a> {
    users: Vec<JoinRequestUser<'a>>,
}

#[derive(Serialize)]
struct JoinRequestUser<'a> {
    id: &'a str,
    dn: &'a str,
    plat: &'static str,
    data: &'static str,
}

#[derive(Serialize)]
struct SquadAssignments<'a> {
    #[serde(rename = "RawSquadAssignments")]
    assignments: Vec<SquadAssignment<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SquadAssignment<'a> {
    member_id: &'a str,
    absolute_member_idx: usize,
}

/// Encode the join-request users blob for `members`, in order.
pub fn join_request_users(members: &[PartyMember]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&JoinRequestUsers {
        users: members
            .iter()
            .map(|m| JoinRequestUser {
                id: m.account_id.as_str(),
                dn: m.display_name().unwrap_or_default(),
                plat: JOIN_REQUEST_PLATFORM,
                data: JOIN_REQUEST_DATA,
            })
            .collect(),
    })
}

/// Encode the positional squad assignment blob for `members`.
pub fn squad_assignments(members: &[PartyMember]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&SquadAssignments {
        assignments: members
            .iter()
            .enumerate()
            .map(|(idx, m)| SquadAssignment {
                member_id: m.account_id.as_str(),
                absolute_member_idx: idx,
            })
            .collect(),
    })
}

/// Append `joiner` and recompute the derived blobs.
///
/// Blobs are computed over the list with the joiner appended and the captain
/// still in place; the captain is moved last afterwards.
pub fn admit(party: &mut Party, joiner: PartyMember) -> Result<(), serde_json::Error> {
    party.members.push(joiner);

    let users = join_request_users(&party.members)?;
    let squad = squad_assignments(&party.members)?;
    party.meta.insert(META_SQUAD_ASSIGNMENTS.to_owned(), squad);

    if let Some(pos) = party.members.iter().position(|m| m.role == Role::Captain) {
        let mut captain = party.members.remove(pos);
        captain.meta.insert(META_JOIN_REQUEST_USERS.to_owned(), users);
        party.members.push(captain);
    }
    Ok(())
}

/// Result of removing a member.
#[derive(Debug, Clone)]
pub struct Departure {
    /// The removed member.
    pub member: PartyMember,
    /// Account promoted to captain, if the captain left and others remain.
    pub promoted: Option<AccountId>,
}

/// Remove `account_id`, promoting the first remaining member if the captain
/// left. Returns `None` if the account is not a member.
pub fn depart(party: &mut Party, account_id: &AccountId) -> Option<Departure> {
    let pos = party
        .members
        .iter()
        .position(|m| &m.account_id == account_id)?;
    let member = party.members.remove(pos);

    let promoted = if member.role == Role::Captain {
        party.members.first_mut().map(|next| {
            next.role = Role::Captain;
            next.account_id.clone()
        })
    } else {
        None
    };
    Some(Departure { member, promoted })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use lobby_types::party::META_DISPLAY_NAME;
    use lobby_types::{Connection, MetaMap, PartyConfig, PartyId};

    use super::*;

    fn member(id: &str, role: Role) -> PartyMember {
        let now = Utc::now();
        let mut meta = MetaMap::new();
        meta.insert(META_DISPLAY_NAME.to_owned(), format!("dn_{id}"));
        PartyMember::new(
            AccountId::from(id),
            role,
            meta,
            Connection::new(format!("{id}@prod"), MetaMap::new(), now),
            now,
        )
    }

    fn party_of(members: Vec<PartyMember>) -> Party {
        let mut party = Party::new(PartyId::from("p1"), PartyConfig::default(), Utc::now());
        party.members = members;
        party
    }

    fn ids(party: &Party) -> Vec<&str> {
        party.members.iter().map(|m| m.account_id.as_str()).collect()
    }

    #[test]
    fn admit_moves_captain_last_and_fills_blobs() {
        let mut party = party_of(vec![member("cap", Role::Captain)]);
        assert!(admit(&mut party, member("m1", Role::Member)).is_ok());
        assert_eq!(ids(&party), vec!["m1", "cap"]);

        let squad = party.meta.get(META_SQUAD_ASSIGNMENTS).cloned().unwrap_or_default();
        let squad: serde_json::Value = serde_json::from_str(&squad).unwrap_or_default();
        assert_eq!(squad["RawSquadAssignments"][0]["memberId"], "cap");
        assert_eq!(squad["RawSquadAssignments"][0]["absoluteMemberIdx"], 0);
        assert_eq!(squad["RawSquadAssignments"][1]["memberId"], "m1");

        let captain = party.captain().map(|c| c.meta.clone()).unwrap_or_default();
        let users = captain.get(META_JOIN_REQUEST_USERS).cloned().unwrap_or_default();
        let users: serde_json::Value = serde_json::from_str(&users).unwrap_or_default();
        assert_eq!(users["users"][1]["id"], "m1");
        assert_eq!(users["users"][1]["dn"], "dn_m1");
        assert_eq!(users["users"][1]["plat"], "WIN");
    }

    #[test]
    fn captain_departure_promotes_first_remaining() {
        let mut party = party_of(vec![
            member("m1", Role::Member),
            member("m2", Role::Member),
            member("cap", Role::Captain),
        ]);
        let departure = depart(&mut party, &AccountId::from("cap"));
        assert_eq!(
            departure.and_then(|d| d.promoted),
            Some(AccountId::from("m1"))
        );
        assert_eq!(
            party.captain().map(|c| c.account_id.as_str()),
            Some("m1")
        );
        assert_eq!(
            party.members.iter().filter(|m| m.role == Role::Captain).count(),
            1
        );
    }

    #[test]
    fn member_departure_keeps_captain() {
        let mut party = party_of(vec![member("m1", Role::Member), member("cap", Role::Captain)]);
        let departure = depart(&mut party, &AccountId::from("m1"));
        assert!(departure.is_some_and(|d| d.promoted.is_none()));
        assert_eq!(ids(&party), vec!["cap"]);
    }

    #[test]
    fn departing_a_stranger_is_none() {
        let mut party = party_of(vec![member("cap", Role::Captain)]);
        assert!(depart(&mut party, &AccountId::from("x")).is_none());
        assert_eq!(party.members.len(), 1);
    }

    #[test]
    fn join_then_leave_restores_member_set() {
        let mut party = party_of(vec![member("cap", Role::Captain), member("m1", Role::Member)]);
        let before: Vec<String> = ids(&party).into_iter().map(str::to_owned).collect();
        assert!(admit(&mut party, member("m2", Role::Member)).is_ok());
        assert!(depart(&mut party, &AccountId::from("m2")).is_some());
        let mut after: Vec<String> = ids(&party).into_iter().map(str::to_owned).collect();
        let mut before_sorted = before;
        before_sorted.sort();
        after.sort();
        assert_eq!(after, before_sorted);
        assert_eq!(party.captain().map(|c| c.account_id.as_str()), Some("cap"));
    }
}
