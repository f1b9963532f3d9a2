// Directory discovery, eligibility and start-offset selection on real trees

use crate::common::fixtures::{touch, video_tree};
use squeeze::engine::{base_name, discover, find_orphaned_temporaries, list_media, select_start_offset};

fn names(dirs: &[&std::path::Path]) -> Vec<String> {
    dirs.iter().map(|d| base_name(d)).collect()
}

#[test]
fn eligibility_is_checked_per_directory() {
    let root = video_tree(&[
        "Course/",
        "Course/Module 10/lecture.mkv",
        "Course/Module 2/intro.mp4",
        "Course/Module 2/notes.pdf",
        "Course/Module 3/slides.pdf",
        "Course/Module 3/Extras/bonus.webm",
    ]);

    let plan = discover(root.path()).unwrap();

    assert_eq!(
        names(&plan.directories()),
        vec!["Extras", "Module 2", "Module 10"]
    );
    let excluded = names(&plan.excluded());
    assert!(excluded.contains(&"Course".to_string()));
    assert!(excluded.contains(&"Module 3".to_string()));
}

#[test]
fn root_with_videos_is_planned() {
    let root = video_tree(&["clip.MP4", "sub/readme.txt"]);
    let plan = discover(root.path()).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(names(&plan.directories()), vec![base_name(root.path())]);
}

#[test]
fn temporaries_do_not_make_a_directory_eligible() {
    let root = video_tree(&["only/temp_clip.mp4"]);
    let plan = discover(root.path()).unwrap();
    assert!(plan.is_empty());

    let only = root.path().join("only");
    assert_eq!(find_orphaned_temporaries(&only), vec![only.join("temp_clip.mp4")]);
}

#[test]
fn missing_root_is_an_error() {
    let root = video_tree(&[]);
    assert!(discover(&root.path().join("nope")).is_err());
}

#[test]
fn start_offset_accepts_only_valid_indices() {
    let root = video_tree(&["a/1.mp4", "b/2.mp4", "c/3.mp4"]);
    let plan = discover(root.path()).unwrap();

    assert_eq!(select_start_offset(&plan, None), 0);
    assert_eq!(select_start_offset(&plan, Some(2)), 2);
    assert_eq!(select_start_offset(&plan, Some(3)), 0);
    assert_eq!(select_start_offset(&plan, Some(-1)), 0);
}

#[test]
fn files_are_listed_in_natural_order() {
    let root = video_tree(&[
        "Part 10.mp4",
        "Part 9.mov",
        "part 1.avi",
        "temp_Part_2.mp4",
        "cover.jpg",
    ]);
    touch(&root.path().join("Part 11.mp4.mp4"));

    let listed: Vec<String> = list_media(root.path())
        .unwrap()
        .into_iter()
        .map(|e| e.raw_name)
        .collect();
    assert_eq!(
        listed,
        vec!["part 1.avi", "Part 9.mov", "Part 10.mp4", "Part 11.mp4.mp4"]
    );
}
