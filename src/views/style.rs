/// Stylesheet embedded in every page.
pub const STYLESHEET: &str = r#"
* { box-sizing: border-box; }
body {
    margin: 0;
    font-family: 'Segoe UI', -apple-system, BlinkMacSystemFont, Helvetica, Arial, sans-serif;
    background: #f5f7fa;
    color: #1f2937;
}
h1, h2, h3 { font-weight: 700; color: #1e3a8a; }
.layout { display: grid; grid-template-columns: 300px 1fr; min-height: 100vh; }
.layout.single { grid-template-columns: 1fr; }
.sidebar { background: #101010; color: #f3f3f3; padding: 24px 18px; }
.sidebar h2 { color: #f3f3f3; font-size: 1.1em; }
.sidebar .line-list { max-height: 320px; overflow-y: auto; margin: 8px 0; }
.sidebar label { display: block; padding: 2px 0; }
.sidebar button { width: 100%; margin-top: 8px; }
main { padding: 24px 32px; }
button {
    background: #6a00f4; color: #fff; border: 0; border-radius: 8px;
    padding: 10px 16px; font-weight: 600; cursor: pointer;
}
button.secondary { background: #374151; }
.hero {
    background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
    padding: 40px; border-radius: 15px; margin-bottom: 30px;
    box-shadow: 0 8px 16px rgba(0,0,0,0.2); text-align: center;
}
.hero h1 { color: #fff; font-size: 2.6em; margin: 0; text-shadow: 2px 2px 4px rgba(0,0,0,0.3); }
.hero p { color: #f0f0f0; font-size: 1.2em; margin-top: 10px; }
.hero .chips { display: flex; justify-content: center; gap: 24px; margin-top: 18px; flex-wrap: wrap; }
.hero .chip { background: rgba(255,255,255,0.2); padding: 8px 18px; border-radius: 20px; color: #fff; font-size: 0.9em; }
.metrics { display: grid; grid-template-columns: repeat(3, 1fr); gap: 20px; margin: 20px 0; }
.metric-card {
    padding: 20px; border-radius: 16px; text-align: center; color: #fff;
    background: linear-gradient(135deg, #6a00f4 0%, #8a2be2 100%);
    box-shadow: 0 0 20px rgba(138, 43, 226, 0.4);
}
.metric-card .value { font-size: 2rem; font-weight: 800; margin-bottom: 8px; }
.metric-card .label { font-size: 1rem; opacity: 0.85; }
.quiz { background: linear-gradient(135deg, #f3f3f3 0%, #ffffff 100%); padding: 30px; border-radius: 15px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); max-width: 720px; margin: 0 auto; }
.quiz .question { font-size: 1.15em; font-weight: 600; margin: 20px 0 10px 0; }
.quiz input[type=text] { width: 100%; padding: 10px; border-radius: 8px; border: 1px solid #d1d5db; }
.quiz .actions { text-align: center; margin-top: 24px; }
.box { padding: 15px 20px; border-radius: 8px; margin: 10px 0; color: #000; }
.box.success { background: #d4edda; border-left: 4px solid #28a745; }
.box.warning { background: #fff3cd; border-left: 4px solid #ffc107; }
.box.info { background: #e7f3ff; border-left: 4px solid #2196f3; }
.box.danger { background: #f8d7da; border-left: 4px solid #dc3545; font-size: 1.1em; }
.box.centered { text-align: center; }
.callout-line { font-size: 2em; color: #dc3545; font-weight: bold; }
.tabs { display: flex; gap: 6px; border-bottom: 2px solid #e5e7eb; margin-top: 24px; flex-wrap: wrap; }
.tabs button { background: transparent; color: #374151; border-radius: 8px 8px 0 0; }
.tabs button.active { background: #6a00f4; color: #fff; }
.tab-panel { display: none; padding-top: 12px; }
.tab-panel.active { display: block; }
table.data { border-collapse: collapse; width: 100%; background: #fff; margin: 12px 0; }
table.data th, table.data td { padding: 8px 12px; border-bottom: 1px solid #e5e7eb; text-align: right; }
table.data th:first-child, table.data td:first-child { text-align: left; }
table.data th { background: #f3f4f6; }
footer { text-align: center; color: #6b7280; padding: 20px; border-top: 1px solid #e5e7eb; margin-top: 40px; }
"#;

/// Draws every embedded figure and wires up the tab strip.
pub const PAGE_SCRIPT: &str = r#"
document.querySelectorAll('script[type="application/json"][data-figure]').forEach(function (node) {
    var fig = JSON.parse(node.textContent);
    Plotly.newPlot(node.dataset.figure, fig.data, fig.layout, {responsive: true});
});
document.querySelectorAll('.tabs button').forEach(function (button) {
    button.addEventListener('click', function () {
        document.querySelectorAll('.tabs button').forEach(function (b) { b.classList.remove('active'); });
        document.querySelectorAll('.tab-panel').forEach(function (p) { p.classList.remove('active'); });
        button.classList.add('active');
        var panel = document.getElementById(button.dataset.tab);
        panel.classList.add('active');
        panel.querySelectorAll('.js-plotly-plot').forEach(function (plot) { Plotly.Plots.resize(plot); });
    });
});
"#;
