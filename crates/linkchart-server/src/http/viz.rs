/// Self-contained D3.js link chart
pub const GRAPH_VIZ_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Linkchart</title>
    <script src="https://d3js.org/d3.v7.min.js"></script>
    <style>
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
            background: #1a1a1a;
            color: #fff;
        }
        #controls {
            position: fixed;
            top: 10px;
            left: 10px;
            background: rgba(0,0,0,0.8);
            padding: 15px;
            border-radius: 8px;
            z-index: 1000;
            font-size: 12px;
        }
        #controls h3 { margin: 0 0 10px 0; font-size: 14px; }
        #controls label { display: block; margin: 5px 0; }
        #controls button { margin-top: 8px; }
        #controls button.active { background: #f59e0b; }
        #stats { margin-top: 10px; color: #aaa; }
        .node { stroke: #fff; stroke-width: 1.5px; cursor: pointer; }
        .node.pending { stroke: #f59e0b; stroke-width: 4px; }
        .link { stroke: #999; stroke-opacity: 0.6; stroke-dasharray: 4 3; }
        .link.manual { stroke: #f59e0b; stroke-opacity: 0.9; stroke-dasharray: none; }
        .node-label { font-size: 10px; pointer-events: none; fill: #fff; text-shadow: 0 0 3px #000; }
        #details {
            position: fixed;
            top: 10px;
            right: 10px;
            width: 320px;
            max-height: 90vh;
            overflow: auto;
            background: rgba(0,0,0,0.9);
            padding: 12px;
            border-radius: 8px;
            font-size: 12px;
            display: none;
        }
    </style>
</head>
<body>
    <div id="controls">
        <h3>Link Chart</h3>
        <label><input type="text" id="caseFilter" placeholder="case id (blank = all)"></label>
        <label><input type="checkbox" id="showSingletons"> Show singletons</label>
        <label><input type="checkbox" id="showHidden"> Show hidden nodes</label>
        <label><input type="checkbox" id="flaggedOnly"> Flagged only</label>
        <label><input type="checkbox" id="showLabels" checked> Show labels</label>
        <button id="linkMode">Link mode: off</button>
        <div id="stats"></div>
    </div>
    <div id="details"></div>
    <svg id="graph"></svg>

    <script>
        const width = window.innerWidth;
        const height = window.innerHeight;

        const svg = d3.select("#graph").attr("width", width).attr("height", height);
        const g = svg.append("g");

        svg.call(d3.zoom()
            .scaleExtent([0.1, 10])
            .on("zoom", (event) => g.attr("transform", event.transform)));

        const colors = { CASE: "#3b82f6", PERSON: "#10b981", ORGANIZATION: "#8b5cf6", UNKNOWN: "#6b7280" };
        const colorOf = d => d.kind === "CASE" ? colors.CASE : colors[d.subtype || "UNKNOWN"];
        const radiusOf = d => d.kind === "CASE" ? 18 : Math.min(6 + 2 * d.connection_count, 24);

        let simulation = null;
        let linking = false;
        let pendingSource = null;
        let lastVersion = -1;

        function query() {
            const p = new URLSearchParams();
            const c = document.getElementById("caseFilter").value.trim();
            if (c) p.set("case", c);
            p.set("show_singletons", document.getElementById("showSingletons").checked);
            p.set("show_hidden", document.getElementById("showHidden").checked);
            p.set("show_flagged_only", document.getElementById("flaggedOnly").checked);
            return p.toString();
        }

        function load() {
            fetch("/graph?" + query())
                .then(r => r.json())
                .then(response => render(response.data));
        }

        // The whole chart is rebuilt on every change; positions are not carried over.
        function render(data) {
            if (simulation) simulation.stop();
            g.selectAll("*").remove();
            pendingSource = null;

            document.getElementById("stats").innerHTML =
                `Reports: ${data.stats.reports_in_scope}<br>` +
                `Entities: ${data.stats.entity_node_count}<br>` +
                `Links: ${data.stats.edge_count}<br>` +
                `Hubs: ${data.stats.hub_count}`;

            const nodes = data.nodes.map(n => ({ ...n }));
            const edges = data.edges.map(e => ({ ...e }));

            simulation = d3.forceSimulation(nodes)
                .force("link", d3.forceLink(edges).id(d => d.id).distance(100))
                .force("charge", d3.forceManyBody().strength(-300))
                .force("x", d3.forceX(width / 2).strength(0.05))
                .force("y", d3.forceY(height / 2).strength(0.05))
                .force("collision", d3.forceCollide().radius(d => radiusOf(d) + 4));

            const link = g.append("g")
                .selectAll("line")
                .data(edges)
                .join("line")
                .attr("class", d => d.is_manual ? "link manual" : "link")
                .attr("stroke-width", d => Math.sqrt(d.weight) * 1.5);

            const node = g.append("g")
                .selectAll("circle")
                .data(nodes)
                .join("circle")
                .attr("class", "node")
                .attr("r", radiusOf)
                .attr("fill", colorOf)
                .call(drag(simulation))
                .on("click", (event, d) => { event.stopPropagation(); clickNode(d, node); });

            const labels = g.append("g")
                .selectAll("text")
                .data(nodes)
                .join("text")
                .attr("class", "node-label")
                .text(d => d.label.substring(0, 28))
                .style("display", document.getElementById("showLabels").checked ? "block" : "none");

            simulation.on("tick", () => {
                link
                    .attr("x1", d => d.source.x)
                    .attr("y1", d => d.source.y)
                    .attr("x2", d => d.target.x)
                    .attr("y2", d => d.target.y);
                node.attr("cx", d => d.x).attr("cy", d => d.y);
                labels.attr("x", d => d.x + radiusOf(d) + 2).attr("y", d => d.y + 3);
            });
        }

        function clickNode(d, node) {
            if (!linking) {
                fetch(`/nodes/${encodeURIComponent(d.id)}?` + query())
                    .then(r => r.json())
                    .then(response => showDetails(response.data));
                return;
            }
            if (pendingSource === null) {
                pendingSource = d.id;
                node.classed("pending", n => n.id === pendingSource);
            } else if (pendingSource === d.id) {
                pendingSource = null;
                node.classed("pending", false);
            } else {
                fetch("/manual/links", {
                    method: "POST",
                    headers: { "Content-Type": "application/json" },
                    body: JSON.stringify({ source: pendingSource, target: d.id })
                }).then(() => { setLinking(false); load(); });
            }
        }

        function showDetails(details) {
            const panel = document.getElementById("details");
            if (!details) { panel.style.display = "none"; return; }
            panel.style.display = "block";
            if (details.kind === "CASE") {
                const r = details.report;
                panel.innerHTML = `<strong>${r.topic}</strong><br>Report: ${r.id}<br>` +
                    `Entities: ${r.entities.length}<br>Status: ${r.status}`;
            } else {
                panel.innerHTML = `<strong>${details.label}</strong><br>${details.subtype}<br>` +
                    `Connections: ${details.connection_count}<br><br>` +
                    details.mentions.map(m => `${m.topic}: ${m.entity.name}`).join("<br>");
            }
        }

        function setLinking(on) {
            linking = on;
            pendingSource = null;
            g.selectAll("circle").classed("pending", false);
            const button = document.getElementById("linkMode");
            button.textContent = on ? "Link mode: on" : "Link mode: off";
            button.classList.toggle("active", on);
        }

        function drag(simulation) {
            return d3.drag()
                .on("start", (event) => {
                    if (!event.active) simulation.alphaTarget(0.3).restart();
                    event.subject.fx = event.subject.x;
                    event.subject.fy = event.subject.y;
                })
                .on("drag", (event) => {
                    event.subject.fx = event.x;
                    event.subject.fy = event.y;
                })
                .on("end", (event) => {
                    if (!event.active) simulation.alphaTarget(0);
                    event.subject.fx = null;
                    event.subject.fy = null;
                });
        }

        svg.on("click", () => {
            if (!linking) document.getElementById("details").style.display = "none";
        });

        document.getElementById("linkMode").addEventListener("click", () => setLinking(!linking));
        document.getElementById("showLabels").addEventListener("change", (e) => {
            g.selectAll(".node-label").style("display", e.target.checked ? "block" : "none");
        });
        for (const id of ["caseFilter", "showSingletons", "showHidden", "flaggedOnly"]) {
            document.getElementById(id).addEventListener("change", load);
        }

        // Poll the store version and rebuild when annotations change elsewhere.
        setInterval(() => {
            fetch("/graph/version")
                .then(r => r.json())
                .then(response => {
                    if (response.data.version !== lastVersion) {
                        lastVersion = response.data.version;
                        load();
                    }
                });
        }, 2000);

        load();
    </script>
</body>
</html>
"##;
