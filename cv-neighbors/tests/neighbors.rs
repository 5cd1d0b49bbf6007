use cv_neighbors::{
    match_neighbors, read_image_list, MatchError, PairListWriter, RegistrationService,
};

const NEW_IMAGES: &str = "/scene/new/0.jpg\n/scene/new/1.jpg\n\n";

const REPORT: &str = "\
# pairwise matches
/scene/old/a.jpg
/scene/new/0.jpg
5
1 2 3 4 5
11 12 13 14 15

/scene/old/c.jpg
/scene/new/0.jpg
5 6 7 8 9 10 16 17 18 19 20
/scene/new/1.jpg
/scene/new/0.jpg
9
1 2 3 4 5 6 7 8 9
1 2 3 4 5 6 7 8 9
/scene/old/b.jpg
/scene/new/0.jpg
2
1 2 3 4
/scene/old/a.jpg
/scene/new/1.jpg
1
7
8
/scene/old/d.jpg
/scene/old/a.jpg
30
";

#[test]
fn ranks_registered_neighbors() {
    let _ = pretty_env_logger::try_init();
    let new_images = read_image_list(NEW_IMAGES.as_bytes()).unwrap();
    // The last record is cut short, which aborts the whole report.
    let err = match_neighbors(&new_images, REPORT.as_bytes(), 5).unwrap_err();
    assert!(matches!(err, MatchError::MissingFeatureIndex { .. }));

    let complete = REPORT.split("/scene/old/d.jpg").next().unwrap();
    let rankings = match_neighbors(&new_images, complete.as_bytes(), 5).unwrap();
    assert_eq!(rankings.len(), 2);

    // Equal counts: the later record ranks first. The new image and the weaker record never do.
    let first: Vec<&str> = rankings[0].neighbors().collect();
    assert_eq!(first, ["/scene/old/c.jpg", "/scene/old/a.jpg"]);
    let pairs: Vec<&[(usize, usize)]> = rankings[0].feature_pairs().collect();
    assert_eq!(pairs[0], &[(6, 16), (7, 17), (8, 18), (9, 19), (10, 20)][..]);

    let second: Vec<&str> = rankings[1].neighbors().collect();
    assert_eq!(second, ["/scene/old/a.jpg"]);

    let mut writer = PairListWriter::new(vec![], 1);
    assert_eq!(writer.register_images(&rankings).unwrap(), 2);
    assert_eq!(
        String::from_utf8(writer.into_inner()).unwrap(),
        "/scene/new/0.jpg /scene/old/c.jpg\n/scene/new/1.jpg /scene/old/a.jpg\n"
    );
}

#[test]
fn rankings_are_limited_to_k() {
    let report: String = (0..6)
        .map(|i| format!("/old/{i}.jpg\n/new.jpg\n{i}\n{}\n", vec!["1"; 2 * i].join(" ")))
        .collect();
    let rankings = match_neighbors(["/new.jpg"], report.as_bytes(), 3).unwrap();
    let neighbors: Vec<&str> = rankings[0].neighbors().collect();
    assert_eq!(neighbors, ["/old/5.jpg", "/old/4.jpg", "/old/3.jpg"]);
}
