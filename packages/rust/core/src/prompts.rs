//! Prompt templates for the enrichment stages.

/// Infer a creator's real name, main niche and language from channel data.
///
/// `channel_json` is a JSON object with `youtube_name`, `youtube_keywords`
/// and `youtube_email`. The model is asked to answer with JSON only.
pub fn name_inference(channel_json: &str) -> String {
    format!(
        r#"below is json scraped from a youtube channel. the youtube_name is often a brand or a nickname rather than the creator's real name.
use the youtube_name, youtube_keywords and youtube_email to infer the creator's real name and the main niche of the channel.
if the channel mainly publishes in a language other than english, set detected_foreign_youtube_channel to true, otherwise false.
answer with a json object using exactly this schema:
-- input --
{{
  "youtube_name": "Coastal Kayak Co",
  "youtube_keywords": "sea kayaking,paddling,kayak fishing,coastal camping,outdoor gear",
  "youtube_email": "marta.lindqvist@coastalkayak.co"
}}
-- output --
{{
  "inferred_name": "Marta Lindqvist",
  "inferred_main_niche": "kayaking",
  "detected_foreign_youtube_channel": false
}}
-- input --
{{
  "youtube_name": "Cocina con Lupe",
  "youtube_keywords": "recetas,cocina mexicana,comida casera,postres,tamales",
  "youtube_email": "contacto@cocinaconlupe.mx"
}}
-- output --
{{
  "inferred_name": "Lupe",
  "inferred_main_niche": "cooking",
  "detected_foreign_youtube_channel": true
}}
-- input --
{{
  "youtube_name": "ByteSizedDev",
  "youtube_keywords": "rust,programming,systems programming,tutorials,coding",
  "youtube_email": "bytesizeddev@gmail.com"
}}
-- output --
{{
  "inferred_name": "ByteSizedDev",
  "inferred_main_niche": "programming",
  "detected_foreign_youtube_channel": false
}}
--
here is your input. respond with the json object only and nothing else.
--
{channel_json}"#
    )
}

/// First call of the opener chain: analyse a video transcript.
pub fn video_analysis(transcript: &str) -> String {
    format!(
        "Answer the following questions about this youtube video:
1. what emotion does the video mainly evoke?
2. what keeps the audience watching?
3. which personality traits of the creator make the channel work?
4. why do the fans love this creator?
5. summarize the most entertaining moment of the video in 3 lines.
6. as one of the creator's biggest fans, write one line about why you enjoyed this video.
answer point by point, numbered.
--
{transcript}
"
    )
}

/// Second call of the opener chain: write the opener from the analysis.
pub fn opener(analysis: &str) -> String {
    format!(
        "You write the first line of a cold email to a youtube creator. You are a big fan of their content. \
The line must prove that a human watched their latest video, using specific moments from it.

Rules:
1. no greeting such as \"hi sam,\"; the email template already has one. write only the first line.
2. never be vague or generic.
3. do not invent stories about yourself. talk only about the creator's video and their craft.
4. write in first person and present tense.

here is an analysis of the video to work from:
--
{analysis}
--

Start your response with:
\"i loved your latest video! i...\"

Use at most 2 sentences and name the moment you liked best.
"
    )
}
