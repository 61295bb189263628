//! The single-page UI served at `/`.
//!
//! The page is rendered from one [`PageView`]. The chat actions post to
//! `/ask`, `/image` and `/voice`, which answer with the whole page rendered
//! after that exchange, so errored replies and notices stay visible even
//! though they were never stored. The sidebar tools use the JSON API.

use std::fmt::{Display, Write as _};

use agrisense_core::{
  advisory::{Irrigation, Season, SoilType},
  assistant::{Backend, Exchange, PageView},
  notice::{Notice, NoticeLevel},
  provider::Language,
  session::{SessionTurn, TurnOrigin},
  turn::Role,
};
use axum::{
  Form,
  extract::{Query, State},
  http::HeaderMap,
  response::Html,
};
use bytes::Bytes;
use serde::Deserialize;
use strum::IntoEnumIterator;

use crate::{
  AppState,
  chat::{UploadParams, audio_clip, image_upload},
  error::ApiError,
  parse_language, speak_reply,
};

/// `GET /`
pub async fn index<B: Backend>(State(state): State<AppState<B>>) -> Html<String> {
  let view = state.assistant.render().await;
  Html(render_page(&view, state.assistant.has_weather()))
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
  #[serde(default)]
  pub message:  String,
  pub language: Option<String>,
  /// Present (as `on`) only when the checkbox is ticked.
  pub speak:    Option<String>,
}

/// `POST /ask`: the chat form.
pub async fn ask<B: Backend>(
  State(state): State<AppState<B>>,
  Form(form): Form<AskForm>,
) -> Html<String> {
  let exchange = match parse_language(form.language.as_deref()) {
    Ok(_) if form.message.trim().is_empty() => {
      rejected(ApiError::BadRequest("message must not be empty".to_owned()))
    }
    Ok(language) => {
      let exchange = state.assistant.ask(&form.message, language).await;
      speak_reply(&state, exchange, form.speak.is_some()).await
    }
    Err(e) => rejected(e),
  };
  render_after(&state, exchange).await
}

/// `POST /voice`: a recorded question, answered with the page.
pub async fn voice<B: Backend>(
  State(state): State<AppState<B>>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Bytes,
) -> Html<String> {
  let input = parse_language(params.language.as_deref())
    .and_then(|language| Ok((language, audio_clip(&headers, body)?)));
  let exchange = match input {
    Ok((language, clip)) => {
      let exchange = state.assistant.ask_by_voice(&clip, language).await;
      speak_reply(&state, exchange, params.speak).await
    }
    Err(e) => rejected(e),
  };
  render_after(&state, exchange).await
}

/// `POST /image`: a crop photo, answered with the page.
pub async fn image<B: Backend>(
  State(state): State<AppState<B>>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Bytes,
) -> Html<String> {
  let input = parse_language(params.language.as_deref())
    .and_then(|language| Ok((language, image_upload(&headers, body)?)));
  let exchange = match input {
    Ok((language, upload)) => {
      let exchange = state.assistant.diagnose(&upload, language).await;
      speak_reply(&state, exchange, params.speak).await
    }
    Err(e) => rejected(e),
  };
  render_after(&state, exchange).await
}

fn rejected(e: ApiError) -> Exchange {
  Exchange { turns: Vec::new(), notices: vec![Notice::error(e.to_string())] }
}

async fn render_after<B: Backend>(state: &AppState<B>, exchange: Exchange) -> Html<String> {
  let view = state.assistant.render_after(exchange).await;
  Html(render_page(&view, state.assistant.has_weather()))
}

pub(crate) fn render_page(view: &PageView, weather_enabled: bool) -> String {
  let mut html = String::with_capacity(8 * 1024);
  html.push_str(HEAD);

  let m = &view.metrics;
  let _ = write!(
    html,
    r#"<section class="dashboard">
<div class="metric"><span>{}</span>Users Today</div>
<div class="metric"><span>{}</span>Weather Alerts</div>
<div class="metric"><span>{}</span>Queries Solved</div>
</section>
"#,
    m.active_days, m.weather_alerts, m.queries_solved,
  );

  html.push_str(r#"<div id="notices">"#);
  for notice in &view.notices {
    push_notice(&mut html, notice);
  }
  html.push_str("</div>\n<main>\n<section class=\"chat\">\n");

  for turn in view.session.turns() {
    push_turn(&mut html, turn);
  }
  if view.session.is_empty() {
    html.push_str(r#"<p class="empty">Ask anything about your crops.</p>"#);
  }

  html.push_str("\n<form id=\"ask\" method=\"post\" action=\"/ask\">\n");
  push_select(&mut html, "language", Language::iter());
  html.push_str(
    r#"
<input name="message" placeholder="Type your farming question" autocomplete="off">
<label><input type="checkbox" name="speak"> Speak reply</label>
<button>Send</button>
</form>
<form id="image"><input type="file" name="file" accept="image/jpeg,image/png"><button>Analyze image</button></form>
<button id="voice">Record voice</button>
</section>
<aside>
"#,
  );

  if weather_enabled {
    html.push_str(
      r#"<form id="weather"><h3>Weather</h3><input name="city" value="Mumbai">
<label><input type="checkbox" name="email"> E-mail alert</label><button>Check</button></form>"#,
    );
  } else {
    html.push_str(r#"<p class="muted">Weather lookups are not configured.</p>"#);
  }
  html.push_str(r#"<form id="crop" data-tool="/api/advice/crop"><h3>Crop advisory</h3>"#);
  push_select(&mut html, "season", Season::iter());
  push_select(&mut html, "soil", SoilType::iter());
  push_select(&mut html, "irrigation", Irrigation::iter());
  html.push_str("<button>Get advice</button></form>\n");
  html.push_str(SIDEBAR_TOOLS);
  html.push_str("</aside>\n</main>\n");
  html.push_str(SCRIPT);
  html.push_str("</body>\n</html>\n");
  html
}

fn push_select<T: Display>(html: &mut String, name: &str, options: impl Iterator<Item = T>) {
  let _ = write!(html, r#"<select name="{name}">"#);
  for option in options {
    let _ = write!(html, "<option>{option}</option>");
  }
  html.push_str("</select>");
}

fn push_notice(html: &mut String, notice: &Notice) {
  let class = match notice.level {
    NoticeLevel::Info => "info",
    NoticeLevel::Warning => "warning",
    NoticeLevel::Error => "error",
  };
  let _ = write!(html, r#"<p class="notice {class}">{}</p>"#, escape(&notice.message));
}

fn push_turn(html: &mut String, turn: &SessionTurn) {
  let who = match turn.role {
    Role::User => "user",
    Role::Assistant => "assistant",
  };
  let _ = write!(html, r#"<div class="turn {who}">"#);
  match &turn.origin {
    TurnOrigin::Stored { timestamp, .. } => {
      let _ = write!(html, "<time>{}</time>", timestamp.format("%Y-%m-%d %H:%M"));
    }
    TurnOrigin::Unsaved { .. } => html.push_str(r#"<small class="warning">not saved</small>"#),
    TurnOrigin::Errored => html.push_str(r#"<small class="error">error</small>"#),
  }
  let _ = writeln!(html, "<p>{}</p></div>", escape(&turn.content));
}

/// Escape text for an HTML element body or a quoted attribute.
pub(crate) fn escape(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>AgriSense</title>
<style>
body{font-family:sans-serif;margin:0;background:#f4f8f2;color:#1d2b1a}
header{background:#2e7d32;color:#fff;padding:.8rem 1.2rem}
.dashboard{display:flex;gap:1rem;padding:1rem}
.metric{background:#fff;border-radius:8px;padding:.8rem 1.2rem;flex:1}
.metric span{display:block;font-size:1.6rem;font-weight:bold}
main{display:flex;gap:1rem;padding:0 1rem 1rem}
.chat{flex:3}aside{flex:1}
.turn{background:#fff;border-radius:8px;margin:.4rem 0;padding:.4rem .8rem}
.turn.user{background:#e3f2e1}
.turn p{white-space:pre-wrap;margin:.2rem 0}
time,small{font-size:.75rem;color:#667}
.notice{padding:.4rem 1rem;margin:.2rem 1rem;border-radius:6px}
.info{background:#e3effa}.warning{background:#fff4d6}.error{background:#fde2e1}
.muted{color:#778}
aside form{background:#fff;border-radius:8px;padding:.6rem;margin-bottom:.8rem}
aside pre{white-space:pre-wrap;font-size:.85rem}
</style>
</head>
<body>
<header><h1>AgriSense</h1></header>
"#;

const SIDEBAR_TOOLS: &str = r#"<form id="soil" data-tool="/api/advice/soil"><h3>Soil health</h3>
<input name="nitrogen" type="number" min="0" max="100" value="30">
<input name="phosphorus" type="number" min="0" max="100" value="30">
<input name="potassium" type="number" min="0" max="100" value="30">
<button>Analyze</button></form>
<form id="market" data-tool="/api/advice/market"><h3>Market prices</h3>
<input name="crop" value="Rice"><button>Look up</button></form>
<pre id="tool-output"></pre>
"#;

const SCRIPT: &str = r#"<script>
(() => {
const out = document.getElementById("tool-output");
const show = (reply) => {
  const notes = (reply.notices || []).map((n) => n.message);
  out.textContent = [reply.error || reply.text || ""].concat(notes).join("\n");
};
const ask = document.getElementById("ask");
const opts = () => "language=" + encodeURIComponent(ask.language.value) + "&speak=" + ask.speak.checked;
const replacePage = async (resp) => {
  const html = await resp.text();
  document.open();
  document.write(html);
  document.close();
};
document.getElementById("image").addEventListener("submit", async (e) => {
  e.preventDefault();
  const file = e.target.file.files[0];
  if (!file) return;
  await replacePage(await fetch("/image?" + opts(), {method: "POST", headers: {"content-type": file.type}, body: file}));
});
document.getElementById("voice").addEventListener("click", async (e) => {
  const stream = await navigator.mediaDevices.getUserMedia({audio: true});
  const rec = new MediaRecorder(stream);
  const chunks = [];
  rec.ondataavailable = (ev) => chunks.push(ev.data);
  rec.onstop = async () => {
    const blob = new Blob(chunks, {type: rec.mimeType});
    await replacePage(await fetch("/voice?" + opts(), {method: "POST", headers: {"content-type": blob.type}, body: blob}));
  };
  e.target.textContent = "Listening...";
  rec.start();
  setTimeout(() => rec.stop(), 5000);
});
const weather = document.getElementById("weather");
if (weather) weather.addEventListener("submit", async (e) => {
  e.preventDefault();
  show(await (await fetch("/api/weather", {method: "POST", headers: {"content-type": "application/json"},
    body: JSON.stringify({city: weather.city.value, email: weather.email.checked})})).json());
});
for (const form of document.querySelectorAll("form[data-tool]")) {
  form.addEventListener("submit", async (e) => {
    e.preventDefault();
    const q = new URLSearchParams(new FormData(form));
    show(await (await fetch(form.dataset.tool + "?" + q)).json());
  });
}
})();
</script>
"#;
