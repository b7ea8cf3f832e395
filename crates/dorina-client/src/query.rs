// Copyright 2025 Dorina-RS Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Assembly of the search payload from a selection snapshot.

use crate::{SearchQuery, SearchSelection, SetBBlock};

/// Sentinel gene list meaning "no gene filter".
pub const ALL_GENES: &str = "all";

/// Build the wire payload for one submission. Pure; the selection is not
/// modified.
///
/// Rules:
/// - an empty gene selection collapses to the `["all"]` sentinel;
/// - the set-B block is emitted iff the set-B selection is non-empty, and
///   always as a whole (set, match, region, operation, window);
/// - window fields are emitted only while their use-flag is set;
/// - the session uuid is echoed once assigned.
pub fn build_search_query(selection: &SearchSelection) -> SearchQuery {
    let genes = if selection.genes.is_empty() {
        vec![ALL_GENES.to_string()]
    } else {
        selection.genes.clone()
    };

    let set_b = if selection.set_b.is_empty() {
        None
    } else {
        Some(SetBBlock {
            set_b: selection.set_b.clone(),
            match_b: selection.match_b,
            region_b: selection.region_b,
            combinatorial_op: selection.combinatorial_op,
            window_b: selection.use_window_b.then_some(selection.window_b),
        })
    };

    SearchQuery {
        set_a: selection.set_a.clone(),
        assembly: selection.assembly.clone(),
        match_a: selection.match_a,
        region_a: selection.region_a,
        genes,
        offset: selection.offset,
        window_a: selection.use_window_a.then_some(selection.window_a),
        set_b,
        uuid: selection.uuid.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CombinatorialOp, MatchMode, RegionFilter};

    fn base_selection() -> SearchSelection {
        SearchSelection {
            set_a: vec!["fake_rbp".into(), "fake_mirna".into()],
            assembly: "hg19".into(),
            region_a: RegionFilter::Cds,
            uuid: Some("fake-uuid".into()),
            ..Default::default()
        }
    }

    #[test]
    fn payload_without_set_b_has_no_set_b_keys() {
        let query = build_search_query(&base_selection());
        let value = serde_json::to_value(&query).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["set_a"], serde_json::json!(["fake_rbp", "fake_mirna"]));
        assert_eq!(obj["assembly"], "hg19");
        assert_eq!(obj["match_a"], "any");
        assert_eq!(obj["region_a"], "CDS");
        assert_eq!(obj["offset"], 0);
        assert_eq!(obj["uuid"], "fake-uuid");
        for key in [
            "set_b",
            "match_b",
            "region_b",
            "combinatorial_op",
            "window_b",
        ] {
            assert!(!obj.contains_key(key), "unexpected key {key}");
        }
    }

    #[test]
    fn set_b_fields_travel_together() {
        let mut sel = base_selection();
        sel.set_b = vec!["fake_mirna".into()];
        sel.region_b = RegionFilter::Cds;
        sel.combinatorial_op = CombinatorialOp::Or;
        let value = serde_json::to_value(build_search_query(&sel)).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["set_b"], serde_json::json!(["fake_mirna"]));
        assert_eq!(obj["match_b"], "any");
        assert_eq!(obj["region_b"], "CDS");
        assert_eq!(obj["combinatorial_op"], "or");
        // window_b still gated by its own flag.
        assert!(!obj.contains_key("window_b"));
    }

    #[test]
    fn window_fields_follow_their_flags() {
        let mut sel = base_selection();
        sel.use_window_a = true;
        sel.window_a = 23;
        sel.set_b = vec!["fake_mirna".into()];
        sel.use_window_b = true;
        sel.window_b = 42;
        let value = serde_json::to_value(build_search_query(&sel)).unwrap();
        assert_eq!(value["window_a"], 23);
        assert_eq!(value["window_b"], 42);

        sel.use_window_a = false;
        sel.use_window_b = false;
        let value = serde_json::to_value(build_search_query(&sel)).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("window_a"));
        assert!(!obj.contains_key("window_b"));
    }

    #[test]
    fn empty_genes_collapse_to_the_all_sentinel() {
        let query = build_search_query(&base_selection());
        assert_eq!(query.genes, vec![ALL_GENES.to_string()]);

        let mut sel = base_selection();
        sel.genes = vec!["gene01.01".into()];
        let query = build_search_query(&sel);
        assert_eq!(query.genes, vec!["gene01.01".to_string()]);
    }

    #[test]
    fn uuid_is_omitted_until_assigned() {
        let mut sel = base_selection();
        sel.uuid = None;
        let value = serde_json::to_value(build_search_query(&sel)).unwrap();
        assert!(!value.as_object().unwrap().contains_key("uuid"));
    }
}
