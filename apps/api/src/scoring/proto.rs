//! Wire messages of the `nlp.NLPService` gRPC API.

pub const PARSE_RESUME_PATH: &str = "/nlp.NLPService/ParseResume";
pub const MATCH_RESUME_VACANCY_PATH: &str = "/nlp.NLPService/MatchResumeVacancy";

#[derive(Clone, PartialEq, prost::Message)]
pub struct ParseRequest {
    #[prost(string, tag = "1")]
    pub text: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ParseResponse {
    /// JSON-encoded object.
    #[prost(string, tag = "1")]
    pub parsed_data: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MatchRequest {
    #[prost(string, tag = "1")]
    pub resume_text: String,
    #[prost(string, tag = "2")]
    pub vacancy_text: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MatchResponse {
    #[prost(float, tag = "1")]
    pub score: f32,
}
