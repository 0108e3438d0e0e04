//! Self-contained HTML dashboard.
//!
//! Only the top `top_n` skills and publishers are embedded, plus the full
//! installs distribution as a flat array for the histogram. Charts are drawn
//! client-side with Plotly from a CDN.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use skillscope_shared::{PublisherAggregate, Result, Skill, SkillscopeError, UNATTRIBUTED_OWNER};

/// Skills and publishers embedded in the page by default.
pub const DEFAULT_TOP_N: usize = 50;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.0.min.js";

/// Render the dashboard page.
///
/// `skills` and `publishers` must already be in pipeline order (installs
/// descending); the first `top_n` of each are embedded.
pub fn render_dashboard(
    skills: &[Skill],
    publishers: &[PublisherAggregate],
    as_of: NaiveDate,
    top_n: usize,
) -> Result<String> {
    let top_skills = &skills[..skills.len().min(top_n)];
    let top_publishers = &publishers[..publishers.len().min(top_n)];
    let installs: Vec<u64> = skills.iter().map(|s| s.installs).collect();

    let total_installs = skills
        .iter()
        .fold(0u64, |acc, s| acc.saturating_add(s.installs));
    let repos: usize = publishers.iter().map(|p| p.repos).sum();

    let skills_json = script_json(top_skills)?;
    let owners_json = script_json(top_publishers)?;
    let installs_json = script_json(&installs)?;

    let skill_count = group_thousands(skills.len() as u64);
    let publisher_count = group_thousands(publishers.len() as u64);
    let repo_count = group_thousands(repos as u64);
    let installs_label = format_millions(total_installs);
    let as_of = as_of.format("%Y-%m-%d").to_string();

    let html = fill(
        TEMPLATE,
        &[
            ("plotly", PLOTLY_CDN),
            ("skill_count", &skill_count),
            ("publisher_count", &publisher_count),
            ("repo_count", &repo_count),
            ("total_installs", &installs_label),
            ("as_of", &as_of),
            ("unattributed", UNATTRIBUTED_OWNER),
            ("skills_json", &skills_json),
            ("owners_json", &owners_json),
            ("installs_json", &installs_json),
        ],
    );

    debug!(
        embedded_skills = top_skills.len(),
        embedded_publishers = top_publishers.len(),
        bytes = html.len(),
        "rendered dashboard"
    );
    Ok(html)
}

/// `1_234_567` → `"1.2M"`.
pub fn format_millions(n: u64) -> String {
    format!("{:.1}M", n as f64 / 1_000_000.0)
}

/// `1234567` → `"1,234,567"`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Serialize for embedding inside `<script>`: `</` is escaped so no value can
/// close the script block.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)
        .map_err(|e| SkillscopeError::Render(format!("failed to serialize dashboard data: {e}")))?;
    Ok(json.replace("</", "<\\/"))
}

/// Single-pass `{{key}}` substitution. Substituted values are never rescanned.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Skills.sh Ecosystem Dashboard</title>
<script src="{{plotly}}"></script>
<style>
  * { margin: 0; padding: 0; box-sizing: border-box; }
  body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
    background: #0a0a0f;
    color: #e0e0e0;
    line-height: 1.6;
  }
  .container { max-width: 1400px; margin: 0 auto; padding: 0 16px; }
  .header { text-align: center; padding: 48px 0 24px; }
  .header h1 { font-size: 2.4rem; font-weight: 800; color: #a78bfa; }
  .stats-row { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; margin: 24px 0 8px; }
  .stat { background: #111118; border: 1px solid #1e1e2e; border-radius: 12px; padding: 20px; text-align: center; }
  .stat .num { font-size: 2rem; font-weight: 700; color: #fff; }
  .stat .label { font-size: 0.8rem; text-transform: uppercase; color: #888; }
  .attribution { text-align: center; color: #666; font-size: 0.85rem; margin-bottom: 32px; }
  .attribution a, .footer a { color: #7c3aed; text-decoration: none; }
  .chart-section { margin: 32px 0; }
  .chart-section h2 { font-size: 1.3rem; margin-bottom: 4px; }
  .subtitle { color: #888; font-size: 0.9rem; margin-bottom: 12px; }
  .chart-container { background: #111118; border: 1px solid #1e1e2e; border-radius: 12px; padding: 12px; }
  .grid-2 { display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }
  .footer { text-align: center; color: #666; padding: 32px 0; border-top: 1px solid #1e1e2e; margin-top: 20px; }
  @media (max-width: 900px) {
    .stats-row { grid-template-columns: repeat(2, 1fr); }
    .grid-2 { grid-template-columns: 1fr; }
  }
</style>
</head>
<body>
<div class="container">

<div class="header">
  <h1>Skills.sh Ecosystem Dashboard</h1>
  <p>Distribution of {{skill_count}} agent skills across {{publisher_count}} publishers</p>
</div>

<div class="stats-row">
  <div class="stat"><div class="num" id="stat-skills">{{skill_count}}</div><div class="label">Total Skills</div></div>
  <div class="stat"><div class="num" id="stat-publishers">{{publisher_count}}</div><div class="label">Publishers</div></div>
  <div class="stat"><div class="num" id="stat-repos">{{repo_count}}</div><div class="label">Repos</div></div>
  <div class="stat"><div class="num" id="stat-installs">{{total_installs}}</div><div class="label">Total Installs</div></div>
</div>
<p class="attribution">Data scraped from <a href="https://skills.sh">skills.sh</a> on {{as_of}}</p>

<div class="chart-section grid-2" id="publishers">
  <div>
    <h2>Top 25 Publishers by Skill Count</h2>
    <p class="subtitle">Who is publishing the most skills?</p>
    <div class="chart-container"><div id="bar-count" style="height:600px;"></div></div>
  </div>
  <div>
    <h2>Top 25 Publishers by Total Installs</h2>
    <p class="subtitle">Who has the most adoption?</p>
    <div class="chart-container"><div id="bar-installs" style="height:600px;"></div></div>
  </div>
</div>

<div class="chart-section" id="top-skills-section">
  <h2>Top 30 Individual Skills by Installs</h2>
  <p class="subtitle">The most installed individual skills across the ecosystem</p>
  <div class="chart-container"><div id="top-skills" style="height:650px;"></div></div>
</div>

<div class="chart-section" id="treemap-section">
  <h2>Treemap: Install Share by Publisher</h2>
  <p class="subtitle">Size = total installs. Click a publisher to zoom into its skills.</p>
  <div class="chart-container"><div id="treemap" style="height:550px;"></div></div>
</div>

<div class="chart-section" id="distribution">
  <h2>Install Distribution</h2>
  <p class="subtitle">Log-scale histogram of installs across every skill</p>
  <div class="chart-container"><div id="histogram" style="height:400px;"></div></div>
</div>

<script>
const skills = {{skills_json}};
const owners = {{owners_json}};
const allInstalls = {{installs_json}};

const bg = '#111118';
const gridColor = '#1e1e2e';
const fontColor = '#999';
const colorscale = [
  [0, '#1e1b4b'], [0.2, '#4c1d95'], [0.4, '#7c3aed'],
  [0.6, '#a78bfa'], [0.8, '#06b6d4'], [1, '#22d3ee']
];
const baseLayout = {
  paper_bgcolor: bg,
  plot_bgcolor: bg,
  font: { color: fontColor },
  margin: { t: 20, b: 40, l: 50, r: 20 },
};
const fmtK = v => v >= 1e6 ? (v / 1e6).toFixed(1) + 'M' : (v / 1000).toFixed(1) + 'K';
const ownerOf = s => {
  const i = s.source.indexOf('/');
  return i > 0 ? s.source.slice(0, i) : '{{unattributed}}';
};

(() => {
  const labels = ['All Skills'], parents = [''], values = [0], texts = [''], colors = [0];
  for (const o of owners) {
    labels.push(o.owner); parents.push('All Skills'); values.push(o.total_installs);
    texts.push(`${o.owner}<br>${o.count} skills<br>${fmtK(o.total_installs)} installs`);
    colors.push(o.total_installs);
  }
  for (const o of owners) {
    for (const s of o.skills) {
      labels.push(`${s.name} (${o.owner})`); parents.push(o.owner); values.push(s.installs);
      texts.push(`${s.name}<br>${s.repo}<br>${fmtK(s.installs)} installs`);
      colors.push(s.installs);
    }
  }
  Plotly.newPlot('treemap', [{
    type: 'treemap', labels, parents, values, text: texts,
    hoverinfo: 'text', textinfo: 'label',
    marker: { colors, colorscale, line: { width: 1, color: gridColor } },
  }], { ...baseLayout, margin: { t: 30, b: 10, l: 10, r: 10 } }, { responsive: true });
})();

const ownerBar = (id, rows, value, title) => Plotly.newPlot(id, [{
  type: 'bar', orientation: 'h',
  y: rows.map(o => o.owner), x: rows.map(value), text: rows.map(o => fmtK(value(o))),
  textposition: 'outside',
  marker: { color: rows.map(value), colorscale },
  hovertext: rows.map(o => `${o.owner}: ${o.count} skills, ${fmtK(o.total_installs)} installs`),
  hoverinfo: 'text',
}], {
  ...baseLayout,
  xaxis: { gridcolor: gridColor, color: fontColor, title },
  yaxis: { color: fontColor, tickfont: { size: 11 } },
  margin: { t: 10, b: 50, l: 140, r: 100 },
}, { responsive: true });

ownerBar('bar-count', owners.slice().sort((a, b) => b.count - a.count).slice(0, 25).reverse(), o => o.count, 'Skills');
ownerBar('bar-installs', owners.slice(0, 25).reverse(), o => o.total_installs, 'Total Installs');

Plotly.newPlot('histogram', [{
  type: 'histogram',
  x: allInstalls.filter(v => v > 0).map(v => Math.log10(v)),
  nbinsx: 40,
  marker: { color: '#7c3aed', line: { width: 1, color: '#4c1d95' } },
}], {
  ...baseLayout,
  xaxis: { title: 'Log10(Installs)', gridcolor: gridColor, color: fontColor },
  yaxis: { title: 'Number of Skills', gridcolor: gridColor, color: fontColor },
  bargap: 0.05,
}, { responsive: true });

(() => {
  const palette = ['#7c3aed', '#06b6d4', '#ec4899', '#f59e0b', '#10b981', '#ef4444', '#8b5cf6', '#14b8a6', '#f97316', '#6366f1'];
  const shade = {};
  let next = 0;
  for (const s of skills.slice(0, 30)) {
    const o = ownerOf(s);
    if (!(o in shade)) shade[o] = palette[next++ % palette.length];
  }
  const top30 = skills.slice(0, 30).reverse();
  Plotly.newPlot('top-skills', [{
    type: 'bar', orientation: 'h',
    y: top30.map(s => s.name), x: top30.map(s => s.installs),
    text: top30.map(s => fmtK(s.installs)), textposition: 'outside',
    marker: { color: top30.map(s => shade[ownerOf(s)]) },
    hovertext: top30.map(s => `${s.name}<br>${s.source}<br>${fmtK(s.installs)} installs`),
    hoverinfo: 'text',
  }], {
    ...baseLayout,
    xaxis: { gridcolor: gridColor, color: fontColor, title: 'Installs' },
    yaxis: { color: fontColor, tickfont: { size: 10 } },
    margin: { t: 10, b: 50, l: 200, r: 80 },
  }, { responsive: true });
})();
</script>

<div class="footer">
  Built with <a href="https://plotly.com/javascript/">Plotly.js</a> &#183;
  Data from <a href="https://skills.sh">skills.sh</a>
</div>

</div>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn catalog(n: usize) -> Vec<Skill> {
        (0..n)
            .map(|i| {
                Skill::new(
                    format!("id-{i}"),
                    format!("skill-{i}"),
                    (n - i) as u64 * 1_000,
                    format!("owner-{}/repo", i % 7),
                )
            })
            .collect()
    }

    fn publishers(n: usize) -> Vec<PublisherAggregate> {
        (0..n)
            .map(|i| PublisherAggregate {
                owner: format!("owner-{i}"),
                count: 1,
                total_installs: (n - i) as u64,
                repos: 2,
                repositories: Default::default(),
                skills: Vec::new(),
            })
            .collect()
    }

    /// Pull the JSON literal assigned to `const <name> = ...;`.
    fn embedded<'a>(html: &'a str, name: &str) -> &'a str {
        let marker = format!("const {name} = ");
        let start = html.find(&marker).unwrap() + marker.len();
        let end = start + html[start..].find(";\n").unwrap();
        &html[start..end]
    }

    #[test]
    fn embeds_top_window_and_full_distribution() {
        let skills = catalog(120);
        let owners = publishers(80);
        let html = render_dashboard(&skills, &owners, date(), DEFAULT_TOP_N).unwrap();

        let embedded_skills: Vec<serde_json::Value> =
            serde_json::from_str(embedded(&html, "skills")).unwrap();
        assert_eq!(embedded_skills.len(), 50);
        assert_eq!(embedded_skills[0]["id"], "id-0");

        let embedded_owners: Vec<serde_json::Value> =
            serde_json::from_str(embedded(&html, "owners")).unwrap();
        assert_eq!(embedded_owners.len(), 50);

        let installs: Vec<u64> = serde_json::from_str(embedded(&html, "allInstalls")).unwrap();
        assert_eq!(installs.len(), 120);
    }

    #[test]
    fn headline_stats_and_date() {
        let skills = vec![
            Skill::new("a", "a", 1_000_000, "x/y"),
            Skill::new("b", "b", 234_567, "x/z"),
        ];
        let owners = publishers(1);
        let html = render_dashboard(&skills, &owners, date(), DEFAULT_TOP_N).unwrap();

        assert!(html.contains(r#"id="stat-installs">1.2M<"#));
        assert!(html.contains(r#"id="stat-skills">2<"#));
        assert!(html.contains(r#"id="stat-repos">2<"#));
        assert!(html.contains("on 2026-03-14"));
        assert!(html.contains(PLOTLY_CDN));
    }

    #[test]
    fn small_inputs_embed_everything() {
        let skills = catalog(3);
        let html = render_dashboard(&skills, &[], date(), DEFAULT_TOP_N).unwrap();
        let embedded_skills: Vec<serde_json::Value> =
            serde_json::from_str(embedded(&html, "skills")).unwrap();
        assert_eq!(embedded_skills.len(), 3);
        assert_eq!(embedded(&html, "owners"), "[]");
    }

    #[test]
    fn script_breakout_is_escaped() {
        let skills = vec![Skill::new("a", "</script><script>alert(1)//", 1, "x/y")];
        let html = render_dashboard(&skills, &[], date(), DEFAULT_TOP_N).unwrap();

        assert!(!html.contains("</script><script>alert"));
        let decoded: Vec<Skill> = serde_json::from_str(embedded(&html, "skills")).unwrap();
        assert_eq!(decoded[0].name, "</script><script>alert(1)//");
    }

    #[test]
    fn placeholders_in_data_are_not_expanded() {
        let skills = vec![Skill::new("a", "{{as_of}}", 1, "x/y")];
        let html = render_dashboard(&skills, &[], date(), DEFAULT_TOP_N).unwrap();
        assert!(html.contains(r#""name":"{{as_of}}""#));
    }

    #[test]
    fn owner_rule_matches_aggregator() {
        let html = render_dashboard(&catalog(2), &[], date(), DEFAULT_TOP_N).unwrap();
        assert!(html.contains("return i > 0 ? s.source.slice(0, i) : '(unattributed)';"));
        assert!(!html.contains("{{unattributed}}"));
    }

    #[test]
    fn total_installs_saturate() {
        let skills = vec![
            Skill::new("a", "a", u64::MAX, "x/y"),
            Skill::new("b", "b", 1, "x/z"),
        ];
        let html = render_dashboard(&skills, &publishers(1), date(), DEFAULT_TOP_N).unwrap();
        assert!(html.contains(&format!(r#"id="stat-installs">{}<"#, format_millions(u64::MAX))));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_millions(0), "0.0M");
        assert_eq!(format_millions(1_240_000), "1.2M");
        assert_eq!(format_millions(48_211_000), "48.2M");

        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
