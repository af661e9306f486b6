use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Section classification derived from the chunk's menu path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionType {
    Troubleshooting,
    Maintenance,
    Installation,
    Parts,
    Safety,
    General,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Troubleshooting => "troubleshooting",
            SectionType::Maintenance => "maintenance",
            SectionType::Installation => "installation",
            SectionType::Parts => "parts",
            SectionType::Safety => "safety",
            SectionType::General => "general",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "troubleshooting" => SectionType::Troubleshooting,
            "maintenance" => SectionType::Maintenance,
            "installation" => SectionType::Installation,
            "parts" => SectionType::Parts,
            "safety" => SectionType::Safety,
            _ => SectionType::General,
        }
    }
}

/// Derived content flags used for retrieval filtering and quality metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFlags {
    pub has_tables: bool,
    pub has_lists: bool,
    pub has_code_numbers: bool,
}

/// A contiguous span of manual text. Unique per (manual_id, content_hash);
/// ingestion and re-ingestion both upsert on that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualChunk {
    id: Uuid,
    manual_id: String,
    tenant_id: String,
    content: String,
    content_hash: String,
    embedding: Option<Vector>,
    page_start: i32,
    page_end: i32,
    menu_path: Option<String>,
    section_heading: Option<String>,
    section_type: SectionType,
    flags: ChunkFlags,
    quality_score: Option<f32>,
    created_at: DateTime<Utc>,
}

impl ManualChunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manual_id: String,
        tenant_id: String,
        content: String,
        content_hash: String,
        page_start: i32,
        page_end: i32,
        menu_path: Option<String>,
        section_heading: Option<String>,
        section_type: SectionType,
        flags: ChunkFlags,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            manual_id,
            tenant_id,
            content,
            content_hash,
            embedding: None,
            page_start,
            page_end,
            menu_path,
            section_heading,
            section_type,
            flags,
            quality_score: None,
            created_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        manual_id: String,
        tenant_id: String,
        content: String,
        content_hash: String,
        embedding: Option<Vector>,
        page_start: i32,
        page_end: i32,
        menu_path: Option<String>,
        section_heading: Option<String>,
        section_type: SectionType,
        flags: ChunkFlags,
        quality_score: Option<f32>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            manual_id,
            tenant_id,
            content,
            content_hash,
            embedding,
            page_start,
            page_end,
            menu_path,
            section_heading,
            section_type,
            flags,
            quality_score,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn manual_id(&self) -> &str {
        &self.manual_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn embedding(&self) -> Option<&Vector> {
        self.embedding.as_ref()
    }

    pub fn page_start(&self) -> i32 {
        self.page_start
    }

    pub fn page_end(&self) -> i32 {
        self.page_end
    }

    pub fn menu_path(&self) -> Option<&str> {
        self.menu_path.as_deref()
    }

    pub fn section_heading(&self) -> Option<&str> {
        self.section_heading.as_deref()
    }

    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    pub fn flags(&self) -> ChunkFlags {
        self.flags
    }

    pub fn quality_score(&self) -> Option<f32> {
        self.quality_score
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_embedding(&mut self, embedding: Vector) {
        self.embedding = Some(embedding);
    }

    pub fn set_quality_score(&mut self, score: f32) {
        self.quality_score = Some(score.clamp(0.0, 1.0));
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn character_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Page range sanity check against a known page count. Chunks that point
    /// past the end of the manual are stale parser output and get dropped
    /// during re-ingestion.
    pub fn page_range_valid(&self, page_count: i32) -> bool {
        self.page_start >= 1 && self.page_end >= self.page_start && self.page_end <= page_count
    }
}
