//! The fixed HTML document served for `"restudio"` bodies: a minimal
//! browser-based explorer that lists the service's methods and lets the
//! user send framed requests against the same endpoint.

pub(crate) const RESTUDIO_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>restudio</title>
<style>
  body { font-family: ui-monospace, monospace; margin: 2rem; background: #fafafa; }
  h1 { font-size: 1.2rem; }
  select, textarea, button { font: inherit; }
  textarea { width: 100%; box-sizing: border-box; }
  pre { background: #f0f0f0; padding: 0.75rem; overflow: auto; }
  label { display: block; margin-top: 1rem; }
</style>
</head>
<body>
<h1>restudio</h1>
<label>Method
  <select id="method"></select>
</label>
<label><input type="checkbox" id="readable" checked> readable</label>
<label>Request JSON
  <textarea id="request" rows="8">{}</textarea>
</label>
<button id="send">Send</button>
<label>Response</label>
<pre id="response"></pre>
<script>
"use strict";
const methodSelect = document.getElementById("method");
const responsePre = document.getElementById("response");
let methods = [];

async function loadMethods() {
  const res = await fetch("", { method: "POST", body: "list" });
  methods = (await res.json()).methods;
  for (const m of methods) {
    const option = document.createElement("option");
    option.value = String(m.number);
    option.textContent = m.method + " (" + m.number + ")";
    methodSelect.appendChild(option);
  }
}

async function send() {
  const method = methods.find((m) => String(m.number) === methodSelect.value);
  if (!method) return;
  const format = document.getElementById("readable").checked ? "readable" : "";
  const payload = document.getElementById("request").value;
  const body = method.method + ":" + method.number + ":" + format + ":" + payload;
  const res = await fetch("", { method: "POST", body });
  const text = await res.text();
  try {
    responsePre.textContent = JSON.stringify(JSON.parse(text), null, 2);
  } catch {
    responsePre.textContent = res.status + ": " + text;
  }
}

document.getElementById("send").addEventListener("click", send);
loadMethods();
</script>
</body>
</html>
"#;
