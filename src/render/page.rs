//! 页面渲染器
//!
//! 输出一个自包含的 HTML 文档：每个注册分类一个标签按钮和一个面板。
//! 客户端状态（主题、默认分类）保存在 localStorage，没有保存值时退回
//! `PagePreferences` 声明的策略。

use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{EnrichedStudy, Track};
use crate::render::escape::{escape_markup, non_blank};
use crate::render::{ArtifactKind, ArtifactRenderer, RenderContext, Rendered};

/// 客户端没有保存主题时的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePolicy {
    /// 跟随系统 `prefers-color-scheme`
    #[default]
    System,
    Light,
    Dark,
}

impl std::str::FromStr for ThemePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(ThemePolicy::System),
            "light" => Ok(ThemePolicy::Light),
            "dark" => Ok(ThemePolicy::Dark),
            _ => Err(ConfigError::UnknownTheme {
                value: s.to_string(),
            }),
        }
    }
}

impl ThemePolicy {
    // 生成客户端求值的回退表达式
    fn fallback_expr(self) -> &'static str {
        match self {
            ThemePolicy::System => {
                "(matchMedia('(prefers-color-scheme: dark)').matches ? 'dark' : 'light')"
            }
            ThemePolicy::Light => "'light'",
            ThemePolicy::Dark => "'dark'",
        }
    }
}

/// 页面偏好的服务端默认值
///
/// 只在客户端没有保存对应偏好时生效
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagePreferences {
    pub theme: ThemePolicy,
    /// `None` 表示使用注册表中的第一个分类
    pub default_track: Option<Track>,
}

impl PagePreferences {
    pub fn fallback_track(&self) -> Track {
        self.default_track.unwrap_or_else(Track::first)
    }
}

/// 标签页面渲染器
pub struct PageRenderer {
    site_title: String,
    preferences: PagePreferences,
}

const STYLE: &str = r#"
    :root { --bg:#fff; --fg:#111; --accent:#0077ff; }
    [data-theme="dark"] { --bg:#121212; --fg:#e5e5e5; --accent:#3399ff; }
    body { margin:0;font-family:system-ui,sans-serif;background:var(--bg);color:var(--fg); }
    header { padding:1rem;display:flex;justify-content:space-between;
             align-items:center;border-bottom:1px solid var(--fg); }
    .tabs { display:flex;flex-wrap:wrap;gap:0.5rem;padding:0 1rem; }
    .tab-btn { cursor:pointer;padding:0.4rem 0.8rem;border:1px solid var(--fg);
               border-radius:4px;background:none;color:var(--fg); }
    .tab-btn.active { background:var(--accent);color:#fff; }
    .track-panel { display:none;padding:1rem; }
    .track-panel.active { display:block; }
    .set-default { margin:0.5rem 0 1rem;padding:0.3rem 0.6rem;border:1px solid var(--accent);
                   background:none;color:var(--accent);cursor:pointer;border-radius:4px; }
    .study-entry { border-bottom:1px solid var(--fg);padding:0.8rem 0; }
    .study-entry h2 { margin:0 0 0.3rem;font-size:1.1rem; }
    .label { font-weight:600; }
"#;

impl PageRenderer {
    pub fn new(site_title: impl Into<String>, preferences: PagePreferences) -> Self {
        Self {
            site_title: site_title.into(),
            preferences,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.site_title.clone(),
            PagePreferences {
                theme: config.default_theme,
                default_track: config.default_track,
            },
        )
    }

    /// 渲染完整页面
    pub fn render_page(&self, ctx: &RenderContext<'_>) -> String {
        let title = escape_markup(&self.site_title);
        let active = self.preferences.fallback_track();
        let tracks: Vec<Track> = ctx.groups.panels().map(|(track, _)| track).collect();

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\" />\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n",
        );
        html.push_str(&format!("  <title>{}</title>\n", title));
        html.push_str(&format!("  <style>{}  </style>\n</head>\n<body>\n", STYLE));
        html.push_str(&format!(
            "<header>\n  <h1>{}</h1>\n  <button id=\"themeToggle\" type=\"button\" title=\"Toggle dark/light mode\">🌙</button>\n</header>\n\n",
            title
        ));

        html.push_str(&render_tabs(&tracks, active));
        html.push('\n');
        for (track, studies) in ctx.groups.panels() {
            html.push_str(&render_panel(track, studies, track == active));
            html.push('\n');
        }

        html.push_str(&self.render_script(&tracks));
        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_script(&self, tracks: &[Track]) -> String {
        let slugs: Vec<&str> = tracks.iter().map(|t| t.slug()).collect();
        let slugs_json = serde_json::to_string(&slugs).unwrap_or_else(|_| "[]".to_string());

        format!(
            r#"<script>
  // ---------- Theme ----------
  const themeBtn = document.getElementById('themeToggle');
  function applyTheme(t) {{
    document.documentElement.dataset.theme = t;
    themeBtn.textContent = t === 'dark' ? '☀️' : '🌙';
  }}
  applyTheme(localStorage.theme || {theme_fallback});
  themeBtn.onclick = () => {{
    const next = document.documentElement.dataset.theme === 'dark' ? 'light' : 'dark';
    localStorage.theme = next;
    applyTheme(next);
  }};

  // ---------- Tabs ----------
  const TRACKS = {slugs};
  const storedTrack = localStorage.defaultTrack;
  const defaultTrack = TRACKS.includes(storedTrack) ? storedTrack : '{track_fallback}';
  const tabs = document.querySelectorAll('.tab-btn');
  const panels = document.querySelectorAll('.track-panel');
  function activate(id) {{
    tabs.forEach(b => b.classList.toggle('active', b.dataset.track === id));
    panels.forEach(p => p.classList.toggle('active', p.id === id));
  }}
  activate(defaultTrack);

  document.getElementById('tabBar').onclick = e => {{
    const btn = e.target.closest('.tab-btn');
    if (btn) activate(btn.dataset.track);
  }};

  // ---------- Set as default ----------
  document.querySelectorAll('.set-default').forEach(btn => {{
    btn.onclick = () => {{
      const id = btn.closest('.track-panel').id;
      localStorage.defaultTrack = id;
      alert(id.replace(/-/g, ' ') + ' is now your default track');
    }};
  }});
</script>
"#,
            theme_fallback = self.preferences.theme.fallback_expr(),
            slugs = slugs_json,
            track_fallback = self.preferences.fallback_track().slug(),
        )
    }
}

impl ArtifactRenderer for PageRenderer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Page
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Rendered {
        Rendered::complete(self.render_page(ctx))
    }
}

fn render_tabs(tracks: &[Track], active: Track) -> String {
    let buttons: String = tracks
        .iter()
        .map(|track| {
            format!(
                "<button class=\"tab-btn{}\" id=\"tab-{}\" data-track=\"{}\" type=\"button\" role=\"tab\">{}</button>",
                if *track == active { " active" } else { "" },
                track.slug(),
                track.slug(),
                escape_markup(track.name())
            )
        })
        .collect();
    format!("<nav class=\"tabs\" id=\"tabBar\" role=\"tablist\">{}</nav>\n", buttons)
}

fn render_panel(track: Track, studies: &[&EnrichedStudy], active: bool) -> String {
    let mut block = vec![format!(
        "<section id=\"{}\" class=\"track-panel{}\" role=\"tabpanel\" aria-labelledby=\"tab-{}\">",
        track.slug(),
        if active { " active" } else { "" },
        track.slug()
    )];
    block.push("<button class=\"set-default\" type=\"button\">Set as Default Track</button>".to_string());
    for study in studies {
        block.push(render_study(study));
    }
    block.push("</section>".to_string());
    block.join("\n")
}

/// 渲染单条记录
pub fn render_study(study: &EnrichedStudy) -> String {
    let title = escape_markup(&study.title);
    let heading = match non_blank(study.resolved_url.as_deref()) {
        Some(url) => format!("<h2><a href=\"{}\">{}</a></h2>", escape_markup(url), title),
        None => format!("<h2>{}</h2>", title),
    };

    let mut h = vec!["<article class=\"study-entry\">".to_string(), heading];
    h.push(format!(
        "<span class=\"label\">Summary:</span><p>{}</p>",
        escape_markup(study.summary.trim())
    ));

    push_text_field(&mut h, "Why notable:", study.why_notable.as_deref());
    push_text_field(&mut h, "Example:", study.example.as_deref());
    push_text_field(&mut h, "Why powerful:", study.why_powerful.as_deref());
    push_text_field(&mut h, "Further explanation:", study.further_explanation.as_deref());

    let projects: Vec<&str> = study
        .projects
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if !projects.is_empty() {
        h.push("<span class=\"label\">Projects using this:</span><ol>".to_string());
        h.extend(
            projects
                .iter()
                .map(|p| format!("<li>{}</li>", escape_markup(p))),
        );
        h.push("</ol>".to_string());
    }

    push_text_field(&mut h, "Lean:", study.lean.as_deref());
    push_text_field(&mut h, "Counterpoint:", study.counterpoint.as_deref());

    h.push("</article>".to_string());
    h.join("\n")
}

fn push_text_field(h: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(text) = non_blank(value) {
        h.push(format!(
            "<span class=\"label\">{}</span><p>{}</p>",
            label,
            escape_markup(text)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Study;
    use crate::services::grouper::group_by_track;

    fn render(studies: &[EnrichedStudy], prefs: PagePreferences) -> String {
        let groups = group_by_track(studies, &Track::ALL);
        let ctx = RenderContext {
            studies,
            groups: &groups,
        };
        PageRenderer::new("Daily Study Digest", prefs).render_page(&ctx)
    }

    #[test]
    fn test_six_tabs_and_panels_with_one_active() {
        let html = render(&[], PagePreferences::default());

        assert_eq!(html.matches("class=\"tab-btn").count(), 6);
        assert_eq!(html.matches("class=\"track-panel").count(), 6);
        assert_eq!(html.matches("class=\"tab-btn active\"").count(), 1);
        assert_eq!(html.matches("class=\"track-panel active\"").count(), 1);
        assert!(html.contains("<section id=\"social-layer\" class=\"track-panel active\""));
        assert!(html.contains("'social-layer';"));
    }

    #[test]
    fn test_configured_default_track_starts_active() {
        let prefs = PagePreferences {
            theme: ThemePolicy::Dark,
            default_track: Some(Track::Horizons),
        };
        let html = render(&[], prefs);

        assert!(html.contains("<section id=\"horizons\" class=\"track-panel active\""));
        assert!(html.contains("class=\"tab-btn active\" id=\"tab-horizons\""));
        assert!(html.contains("localStorage.theme || 'dark'"));
        assert!(html.contains("'horizons';"));
    }

    #[test]
    fn test_system_theme_follows_media_query_by_default() {
        let html = render(&[], PagePreferences::default());
        assert!(html.contains("localStorage.theme || (matchMedia('(prefers-color-scheme: dark)')"));
        assert!(html.contains(r#"const TRACKS = ["social-layer","capital","play","health","horizons","state"];"#));
    }

    #[test]
    fn test_theme_policy_parses_names() {
        assert_eq!(" Dark ".parse::<ThemePolicy>().unwrap(), ThemePolicy::Dark);
        assert_eq!("system".parse::<ThemePolicy>().unwrap(), ThemePolicy::System);
        assert!(matches!(
            "sepia".parse::<ThemePolicy>(),
            Err(ConfigError::UnknownTheme { .. })
        ));
    }

    #[test]
    fn test_absent_and_empty_optionals_render_no_label() {
        let mut study = Study::new("Plain", "The Social Layer", "Only a summary");
        study.example = Some(String::new());
        study.counterpoint = Some("   ".into());
        study.projects = Some(vec![" ".into()]);
        let block = render_study(&EnrichedStudy::new(study, None));

        assert!(block.contains("<h2>Plain</h2>"));
        assert!(block.contains("Summary:"));
        for label in [
            "Why notable:",
            "Example:",
            "Why powerful:",
            "Further explanation:",
            "Projects using this:",
            "Lean:",
            "Counterpoint:",
        ] {
            assert!(!block.contains(label), "unexpected label {}", label);
        }
    }

    #[test]
    fn test_present_optionals_render_in_order() {
        let mut study = Study::new("Full", "Systems of Play", "s");
        study.why_notable = Some("notable".into());
        study.projects = Some(vec!["One".into(), "Two".into()]);
        study.lean = Some("left".into());
        let block = render_study(&EnrichedStudy::new(study, None));

        let notable = block.find("Why notable:").unwrap();
        let projects = block.find("Projects using this:").unwrap();
        let lean = block.find("Lean:").unwrap();
        assert!(notable < projects && projects < lean);
        assert!(block.contains("<ol>\n<li>One</li>\n<li>Two</li>\n</ol>"));
    }

    #[test]
    fn test_title_links_only_when_resolved() {
        let study = Study::new("A & B", "The State Layer", "s");
        let linked = render_study(&EnrichedStudy::new(
            study.clone(),
            Some("https://doi.org/10.1/x".into()),
        ));
        let plain = render_study(&EnrichedStudy::new(study, None));

        assert!(linked.contains("<h2><a href=\"https://doi.org/10.1/x\">A &amp; B</a></h2>"));
        assert!(plain.contains("<h2>A &amp; B</h2>"));
    }

    #[test]
    fn test_markup_in_fields_is_escaped() {
        let study = Study::new("<script>x</script>", "The Health Layer", "a < b");
        let block = render_study(&EnrichedStudy::new(study, None));
        assert!(!block.contains("<script>x"));
        assert!(block.contains("<p>a &lt; b</p>"));
    }
}
