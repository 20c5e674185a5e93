mod answer;
mod apidb;
mod build_prompt;
mod config;
mod embed;
mod error;
mod generate;
mod http;
mod index;
mod markers;
mod metadata;
mod questionnaire;
mod scan_files;
mod search;
mod store_memory;
mod store_qdrant;
mod submit_report;
mod transcribe;
mod verify_dialog;
mod verify_loop;
mod vision;

pub use answer::AnswerSynthesizer;
pub use apidb::ApiDbClient;
pub use build_prompt::{
    build_answer_prompt, build_metadata_prompt, ContentPart, ImageUrl, Message, MessageContent,
};
pub use config::{require, Config};
pub use embed::{Embedder, OpenAiEmbedder};
pub use error::{Error, Result};
pub use generate::{ChatProvider, ChatRequest, OpenAiChat};
pub use http::{
    content_type, encode_form, get_text, post_form, post_json, post_multipart, put_json, Body,
    HttpRequest, HttpResponse, HttpTransport, Method, Part, Transport,
};
pub use index::{DocumentIndexer, IndexingSummary};
pub use markers::{extract_href, extract_question, has_login_form, join_link};
pub use metadata::{
    date_from_filename, parse_analysis, point_id, CorpusDocument, DocumentAnalysis,
    DocumentPayload, MetadataExtractor,
};
pub use questionnaire::{answer_all, parse_questions, Question};
pub use scan_files::scan_files;
pub use search::{BestMatch, SimilaritySearch};
pub use store_memory::{cosine_sim, MemoryStore};
pub use store_qdrant::{Distance, Point, QdrantStore, ScoredPoint, VectorStore};
pub use submit_report::{find_flag, submit_report, ReportClient, ReportEnvelope, ReportResponse};
pub use transcribe::{
    audio_mime, transcribe_folder, transcript_path, OpenAiTranscriber, Transcriber,
    TranscriptionSummary, AUDIO_EXTENSIONS, MAX_AUDIO_BYTES,
};
pub use verify_dialog::{exchange, run_dialog, VerifyMessage, READY, ROBOT_SYSTEM_PROMPT};
pub use verify_loop::{
    LoopConfig, LoopOutcome, LoopState, Sleeper, ThreadSleeper, VerificationLoop,
    NUMERIC_ANSWER_PROMPT,
};
pub use vision::{data_url, describe_image};
