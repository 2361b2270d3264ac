use serde_json::json;

use grid_sweep_core::jobs::Job;
use grid_sweep_core::prompt_set::PromptSet;
use grid_sweep_core::request::{build_request, GridPlotArgs, GRID_PLOT_ARITY};

fn train_set() -> PromptSet {
    PromptSet {
        folder: "train".to_string(),
        filenames: vec!["a-1.txt".into(), "a-2.txt".into(), "a-3.txt".into()],
        wire: r#""cat","dog","fish""#.to_string(),
        anchor_prompt: "cat".to_string(),
    }
}

#[test]
fn test_request_serializes_to_exact_txt2img_payload() {
    let set = train_set();
    let job = Job {
        clip_skip: 2,
        seed: 1234,
        prompt_set: &set,
    };

    let request = build_request(&job, "model.safetensors", 768);
    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(
        value,
        json!({
            "prompt": "cat",
            "negative_prompt": "",
            "seed": 1234,
            "sampler_name": "DDIM",
            "steps": 30,
            "width": 768,
            "height": 768,
            "cfg_scale": 7,
            "n_iter": 1,
            "batch_size": 1,
            "override_settings": {
                "sd_model_checkpoint": "model.safetensors",
                "CLIP_stop_at_last_layers": 2
            },
            "script_name": "x/y/z plot",
            "script_args": [
                7, "\"cat\",\"dog\",\"fish\"",
                0, "",
                0, "",
                false, false, false, false, true, false, false, false,
                0
            ]
        })
    );
}

#[test]
fn test_grid_plot_args_serialize_to_fixed_arity_array() {
    let args = GridPlotArgs::prompt_sweep("\"x\"");
    let text = serde_json::to_string(&args).unwrap();

    assert_eq!(
        text,
        r#"[7,"\"x\"",0,"",0,"",false,false,false,false,true,false,false,false,0]"#
    );
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value.as_array().unwrap().len(), GRID_PLOT_ARITY);
}

#[test]
fn test_negative_seed_is_passed_through() {
    let set = train_set();
    let job = Job {
        clip_skip: 0,
        seed: -1,
        prompt_set: &set,
    };

    let request = build_request(&job, "m", 512);
    assert_eq!(request.seed, -1);
    assert_eq!(request.override_settings.clip_stop_at_last_layers, 0);
}
