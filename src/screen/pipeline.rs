use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::PipelineConfig;
use crate::llm::CompletionProvider;
use crate::models::{
    DuplicateGroup, FallbackPolicy, RecordFate, RecordId, ScreeningReport, Table, Verdict,
};
use crate::screen::completeness::missing_abstracts;
use crate::screen::dedup::{deduplicate, dropped_ids};
use crate::screen::exclusion::{retain_survivors, ExclusionSet};
use crate::screen::keyword::KeywordGate;
use crate::screen::relevance::RelevanceClassifier;

/// Surviving rows plus what happened to everything else.
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    pub kept: Table,
    pub report: ScreeningReport,
}

/// Result of the rule-based stages alone.
#[derive(Debug, Clone)]
pub struct Prefilter {
    pub table: Table,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub no_abstract: BTreeSet<RecordId>,
    pub no_keyword: BTreeSet<RecordId>,
}

impl Prefilter {
    /// Records that still need an LLM verdict, in table order.
    pub fn candidates(&self) -> Vec<RecordId> {
        self.table
            .records
            .iter()
            .map(|r| r.id)
            .filter(|id| !self.no_abstract.contains(id) && !self.no_keyword.contains(id))
            .collect()
    }
}

/// Dedup, completeness and keyword stages. No LLM calls.
pub fn prefilter(table: Table, keyword_gate: &KeywordGate) -> Prefilter {
    let (table, duplicate_groups) = deduplicate(table);
    let no_abstract = missing_abstracts(&table);
    let no_keyword = keyword_gate.flag(&table, &no_abstract);

    Prefilter {
        table,
        duplicate_groups,
        no_abstract,
        no_keyword,
    }
}

#[derive(Default)]
struct VerdictBuckets {
    unrelated: Vec<RecordId>,
    mentioned_only: Vec<RecordId>,
    unparseable: Vec<RecordId>,
    errored: Vec<RecordId>,
    classified: Vec<RecordId>,
}

pub struct ScreeningPipeline {
    keyword_gate: KeywordGate,
    classifier: RelevanceClassifier,
    config: PipelineConfig,
}

impl ScreeningPipeline {
    pub fn new(llm: impl CompletionProvider + 'static, config: PipelineConfig) -> Self {
        Self::with_provider(Arc::new(llm), config)
    }

    pub fn with_provider(llm: Arc<dyn CompletionProvider>, config: PipelineConfig) -> Self {
        Self {
            keyword_gate: KeywordGate::new(&config.keywords),
            classifier: RelevanceClassifier::new(llm, config.language, config.keywords.clone()),
            config,
        }
    }

    pub fn prefilter(&self, table: Table) -> Prefilter {
        prefilter(table, &self.keyword_gate)
    }

    pub async fn run(&self, table: Table) -> ScreeningOutcome {
        let started_at = Utc::now();
        let total_records = table.len();

        let prefilter = self.prefilter(table);
        let candidates = prefilter.candidates();
        tracing::info!("{} record(s) sent to the relevance classifier", candidates.len());

        let buckets = self.classify_all(&prefilter.table, &candidates).await;

        let mut excluded = ExclusionSet::new();
        excluded.extend(&prefilter.no_abstract);
        excluded.extend(&prefilter.no_keyword);
        excluded.extend(&buckets.unrelated);
        excluded.extend(&buckets.mentioned_only);
        if self.config.fallback == FallbackPolicy::Exclude {
            excluded.extend(&buckets.unparseable);
            excluded.extend(&buckets.errored);
        }

        let fates = self.collect_fates(&prefilter, &buckets, &excluded);
        let kept = retain_survivors(prefilter.table, &excluded);
        tracing::info!("Screening complete: {} of {} record(s) kept", kept.len(), total_records);

        let report = ScreeningReport {
            started_at,
            finished_at: Utc::now(),
            total_records,
            duplicate_groups: prefilter.duplicate_groups,
            no_abstract: prefilter.no_abstract.into_iter().collect(),
            no_keyword: prefilter.no_keyword.into_iter().collect(),
            unrelated: buckets.unrelated,
            mentioned_only: buckets.mentioned_only,
            unparseable: buckets.unparseable,
            errored: buckets.errored,
            classified: buckets.classified,
            kept: kept.ids(),
            fates,
        };

        ScreeningOutcome { kept, report }
    }

    async fn classify_all(&self, table: &Table, candidates: &[RecordId]) -> VerdictBuckets {
        let pb = if self.config.show_progress {
            ProgressBar::new(candidates.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} abstracts")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut buckets = VerdictBuckets::default();

        for &id in candidates {
            let Some(record) = table.get(id) else {
                continue;
            };
            let abstract_text = record.abstract_text.as_deref().unwrap_or_default().trim();

            buckets.classified.push(id);
            match self.classifier.classify(id, abstract_text).await {
                Verdict::Unrelated => buckets.unrelated.push(id),
                Verdict::MentionedOnly => buckets.mentioned_only.push(id),
                Verdict::Unparseable { .. } => buckets.unparseable.push(id),
                Verdict::Error { .. } => buckets.errored.push(id),
                Verdict::Related => {}
            }

            pb.inc(1);
        }

        pb.finish_with_message("Classification complete");
        buckets
    }

    fn collect_fates(
        &self,
        prefilter: &Prefilter,
        buckets: &VerdictBuckets,
        excluded: &ExclusionSet,
    ) -> BTreeMap<RecordId, RecordFate> {
        let mut fates = BTreeMap::new();

        for id in dropped_ids(&prefilter.duplicate_groups) {
            fates.insert(id, RecordFate::DroppedDuplicate);
        }

        for id in prefilter.table.ids() {
            let fate = if prefilter.no_abstract.contains(&id) {
                RecordFate::ExcludedNoAbstract
            } else if prefilter.no_keyword.contains(&id) {
                RecordFate::ExcludedNoKeyword
            } else if buckets.unrelated.contains(&id) {
                RecordFate::ExcludedUnrelated
            } else if buckets.mentioned_only.contains(&id) {
                RecordFate::ExcludedMentioned
            } else if excluded.contains(id) {
                RecordFate::ExcludedUnclassified
            } else if buckets.errored.contains(&id) {
                RecordFate::KeptOnError
            } else if buckets.unparseable.contains(&id) {
                RecordFate::KeptOnUnparseable
            } else {
                RecordFate::Kept
            };
            fates.insert(id, fate);
        }

        fates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::llm::{CompletionRequest, Language};
    use crate::models::Record;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies by looking for a marker in the prompt; records every abstract it saw.
    struct ScriptedProvider {
        script: Vec<(&'static str, Option<&'static str>)>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<(&'static str, Option<&'static str>)>) -> Arc<Self> {
            Arc::new(Self {
                script,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let reply = self
                .script
                .iter()
                .find(|(marker, _)| request.prompt.contains(marker))
                .and_then(|(_, reply)| *reply);
            reply
                .map(str::to_string)
                .ok_or_else(|| Error::LLMApi("connection reset".to_string()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn english(fallback: FallbackPolicy) -> PipelineConfig {
        PipelineConfig {
            keywords: vec!["chatbot".to_string()],
            language: Language::English,
            fallback,
            show_progress: false,
        }
    }

    fn table(rows: &[(Option<&str>, Option<&str>)]) -> Table {
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, (t, a))| Record::new(i, *t, *a))
            .collect();
        Table::new(vec!["Title".into(), "Abstract".into()], records)
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let provider = ScriptedProvider::new(vec![
            ("policy adoption", Some("related")),
            ("mention of anything", Some("unrelated")),
        ]);
        let pipeline = ScreeningPipeline::with_provider(provider.clone(), english(FallbackPolicy::Keep));
        let input = table(&[
            (Some("A"), Some("no chatbot mention of anything")),
            (Some("A"), Some("irrelevant")),
            (Some("B"), Some("")),
            (Some("C"), Some("a chatbot study of policy adoption")),
        ]);

        let outcome = pipeline.run(input).await;
        let report = &outcome.report;

        // "no chatbot mention" still contains the keyword as a substring, so
        // record 0 is gated through and removed by the classifier instead.
        assert_eq!(report.fate(RecordId(0)), Some(RecordFate::ExcludedUnrelated));
        assert_eq!(report.fate(RecordId(1)), Some(RecordFate::DroppedDuplicate));
        assert_eq!(report.fate(RecordId(2)), Some(RecordFate::ExcludedNoAbstract));
        assert_eq!(report.fate(RecordId(3)), Some(RecordFate::Kept));
        assert_eq!(report.duplicate_count(), 2);
        assert_eq!(report.total_records, 4);
        assert_eq!(outcome.kept.ids(), vec![RecordId(3)]);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_without_keyword() {
        let provider = ScriptedProvider::new(vec![("policy adoption", Some("related"))]);
        let pipeline = ScreeningPipeline::with_provider(provider.clone(), english(FallbackPolicy::Keep));
        let input = table(&[
            (Some("A"), Some("no mention of anything")),
            (Some("A"), Some("irrelevant")),
            (Some("B"), Some("")),
            (Some("C"), Some("a chatbot study of policy adoption")),
        ]);

        let outcome = pipeline.run(input).await;
        let report = &outcome.report;

        assert_eq!(report.fate(RecordId(0)), Some(RecordFate::ExcludedNoKeyword));
        assert_eq!(report.fate(RecordId(1)), Some(RecordFate::DroppedDuplicate));
        assert_eq!(report.fate(RecordId(2)), Some(RecordFate::ExcludedNoAbstract));
        assert_eq!(report.fate(RecordId(3)), Some(RecordFate::Kept));
        assert_eq!(outcome.kept.ids(), vec![RecordId(3)]);
        assert_eq!(report.classified, vec![RecordId(3)]);
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_verdict_mapping_under_keep_policy() {
        let provider = ScriptedProvider::new(vec![
            ("marker-related", Some("related")),
            ("marker-mentioned", Some("mentioned_only")),
            ("marker-unrelated", Some("  unrelated\n")),
            ("marker-chatty", Some("It is related.")),
            ("marker-broken", None),
        ]);
        let pipeline = ScreeningPipeline::with_provider(provider, english(FallbackPolicy::Keep));
        let input = table(&[
            (Some("1"), Some("chatbot marker-related")),
            (Some("2"), Some("chatbot marker-mentioned")),
            (Some("3"), Some("chatbot marker-unrelated")),
            (Some("4"), Some("chatbot marker-chatty")),
            (Some("5"), Some("chatbot marker-broken")),
        ]);

        let outcome = pipeline.run(input).await;
        let report = &outcome.report;

        assert_eq!(report.mentioned_only, vec![RecordId(1)]);
        assert_eq!(report.unrelated, vec![RecordId(2)]);
        assert_eq!(report.unparseable, vec![RecordId(3)]);
        assert_eq!(report.errored, vec![RecordId(4)]);
        assert_eq!(
            outcome.kept.ids(),
            vec![RecordId(0), RecordId(3), RecordId(4)]
        );
        assert_eq!(report.fate(RecordId(3)), Some(RecordFate::KeptOnUnparseable));
        assert_eq!(report.fate(RecordId(4)), Some(RecordFate::KeptOnError));
    }

    #[tokio::test]
    async fn test_exclude_policy_drops_unclassified() {
        let provider = ScriptedProvider::new(vec![
            ("marker-chatty", Some("probably related")),
            ("marker-broken", None),
            ("marker-related", Some("related")),
        ]);
        let pipeline = ScreeningPipeline::with_provider(provider, english(FallbackPolicy::Exclude));
        let input = table(&[
            (Some("1"), Some("chatbot marker-chatty")),
            (Some("2"), Some("chatbot marker-broken")),
            (Some("3"), Some("chatbot marker-related")),
        ]);

        let outcome = pipeline.run(input).await;

        assert_eq!(outcome.kept.ids(), vec![RecordId(2)]);
        assert_eq!(
            outcome.report.fate(RecordId(0)),
            Some(RecordFate::ExcludedUnclassified)
        );
        assert_eq!(
            outcome.report.fate(RecordId(1)),
            Some(RecordFate::ExcludedUnclassified)
        );
    }

    #[tokio::test]
    async fn test_only_gated_candidates_reach_classifier() {
        let provider = ScriptedProvider::new(vec![("chatbot", Some("related"))]);
        let pipeline = ScreeningPipeline::with_provider(provider.clone(), english(FallbackPolicy::Keep));
        let input = table(&[
            (Some("1"), None),
            (Some("2"), Some("   ")),
            (Some("3"), Some("voice assistants")),
            (Some("4"), Some("  CHATBOT design  ")),
            (None, Some("chatbot without title")),
            (None, Some("chatbot without title")),
        ]);

        let prefilter = pipeline.prefilter(input.clone());
        let expected: Vec<RecordId> = prefilter
            .table
            .ids()
            .into_iter()
            .filter(|id| !prefilter.no_abstract.contains(id) && !prefilter.no_keyword.contains(id))
            .collect();

        let outcome = pipeline.run(input).await;

        assert_eq!(outcome.report.classified, expected);
        assert_eq!(expected, vec![RecordId(3), RecordId(4), RecordId(5)]);
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("\"\"\"CHATBOT design\"\"\""));
        assert!(prompts.iter().all(|p| !p.contains("voice assistants")));
    }

    #[tokio::test]
    async fn test_excluded_records_never_survive() {
        let provider = ScriptedProvider::new(vec![("drop", Some("unrelated")), ("keep", Some("related"))]);
        let pipeline = ScreeningPipeline::with_provider(provider, english(FallbackPolicy::Keep));
        let input = table(&[
            (Some("x"), Some("chatbot keep")),
            (Some("y"), Some("chatbot drop")),
            (Some("x"), Some("chatbot keep")),
            (Some("z"), None),
            (Some("w"), Some("chatbot keep")),
        ]);

        let outcome = pipeline.run(input).await;
        let report = &outcome.report;

        for id in report
            .no_abstract
            .iter()
            .chain(&report.no_keyword)
            .chain(&report.unrelated)
            .chain(&report.mentioned_only)
            .chain(dropped_ids(&report.duplicate_groups).iter())
        {
            assert!(outcome.kept.get(*id).is_none());
            assert!(!report.fates[id].is_kept());
        }
        assert_eq!(outcome.kept.ids(), vec![RecordId(0), RecordId(4)]);
        assert_eq!(report.kept, outcome.kept.ids());
    }
}
