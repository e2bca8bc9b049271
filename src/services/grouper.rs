//! 分类分组服务 - 业务能力层
//!
//! 面板集合由注册表决定，而不是由数据决定：没有记录的分类也会得到一个空面板。

use crate::models::{EnrichedStudy, Track};

/// 按注册表顺序分组后的记录
#[derive(Debug)]
pub struct TrackGroups<'a> {
    panels: Vec<(Track, Vec<&'a EnrichedStudy>)>,
    ungrouped: Vec<&'a EnrichedStudy>,
}

impl<'a> TrackGroups<'a> {
    /// 按注册表顺序遍历 (分类, 记录列表)
    pub fn panels<'s>(&'s self) -> impl Iterator<Item = (Track, &'s [&'a EnrichedStudy])> + 's {
        self.panels
            .iter()
            .map(|(track, studies)| (*track, studies.as_slice()))
    }

    /// 某个分类下的记录
    pub fn studies_in(&self, track: Track) -> &[&'a EnrichedStudy] {
        self.panels
            .iter()
            .find(|(t, _)| *t == track)
            .map(|(_, studies)| studies.as_slice())
            .unwrap_or(&[])
    }

    /// 分类不在注册表中的记录
    pub fn ungrouped(&self) -> &[&'a EnrichedStudy] {
        &self.ungrouped
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }
}

/// 单次遍历，把记录追加到同名分类下，分类内保持输入顺序
pub fn group_by_track<'a>(studies: &'a [EnrichedStudy], registry: &[Track]) -> TrackGroups<'a> {
    let mut panels: Vec<(Track, Vec<&'a EnrichedStudy>)> =
        registry.iter().map(|track| (*track, Vec::new())).collect();
    let mut ungrouped = Vec::new();

    for study in studies {
        match panels
            .iter_mut()
            .find(|(track, _)| track.name() == study.track)
        {
            Some((_, bucket)) => bucket.push(study),
            None => ungrouped.push(study),
        }
    }

    TrackGroups { panels, ungrouped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Study;

    fn enriched(title: &str, track: &str) -> EnrichedStudy {
        EnrichedStudy::new(Study::new(title, track, "s"), None)
    }

    #[test]
    fn test_every_registry_track_gets_a_panel() {
        let studies = vec![enriched("a", "Systems of Play")];
        let groups = group_by_track(&studies, &Track::ALL);

        assert_eq!(groups.panel_count(), 6);
        let order: Vec<Track> = groups.panels().map(|(t, _)| t).collect();
        assert_eq!(order, Track::ALL.to_vec());
        assert_eq!(groups.studies_in(Track::Play).len(), 1);
        assert!(groups.studies_in(Track::State).is_empty());
    }

    #[test]
    fn test_grouping_is_stable_within_track() {
        let studies = vec![
            enriched("h1", "The Health Layer"),
            enriched("s1", "The State Layer"),
            enriched("h2", "The Health Layer"),
            enriched("h3", "The Health Layer"),
        ];
        let groups = group_by_track(&studies, &Track::ALL);

        let titles: Vec<&str> = groups
            .studies_in(Track::Health)
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn test_unregistered_tracks_are_ungrouped() {
        let studies = vec![
            enriched("u", "Unknown Layer"),
            enriched("lower", "the social layer"),
            enriched("ok", "The Social Layer"),
        ];
        let groups = group_by_track(&studies, &Track::ALL);

        assert_eq!(groups.ungrouped().len(), 2);
        let placed: usize = groups.panels().map(|(_, s)| s.len()).sum();
        assert_eq!(placed, 1);
    }
}
